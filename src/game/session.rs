use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::config::Rules;
use crate::progress::{Progress, ProgressStore};

use super::layout::{answer_button, Bounds, Point, ANSWER_BUTTONS};
use super::object::ClickableObject;

/// Which screen the player is looking at. Data that only makes sense on one
/// screen lives in that variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Room,
    Question { active: usize },
    Lock { input: String },
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Click(Point),
    Key(KeyEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub until: Instant,
}

pub struct Session {
    rules: Rules,
    objects: Vec<ClickableObject>,
    expected_code: String,
    screen: Screen,
    solved: BTreeSet<String>,
    mistakes: u32,
    toast: Option<Toast>,
    flash_until: Option<Instant>,
    debug: bool,
    store: ProgressStore,
}

impl Session {
    /// Starts a session, restoring whatever progress the store holds.
    pub fn new(objects: Vec<ClickableObject>, rules: Rules, store: ProgressStore) -> Self {
        let expected_code = objects.iter().map(|o| o.question.letter.as_str()).collect();
        let mut session = Session {
            rules,
            objects,
            expected_code,
            screen: Screen::Room,
            solved: BTreeSet::new(),
            mistakes: 0,
            toast: None,
            flash_until: None,
            debug: false,
            store,
        };

        let progress = session.store.load();
        for object in &mut session.objects {
            if progress.solved.contains(&object.question.id) {
                object.solved = true;
                session.solved.insert(object.question.id.clone());
            }
        }
        session.mistakes = progress.mistakes;
        if session.mistakes >= session.rules.max_mistakes {
            session.screen = Screen::Lost;
        }
        log::info!(
            "session started: {} objects, {} solved, {} mistakes",
            session.objects.len(),
            session.solved.len(),
            session.mistakes
        );
        session
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn objects(&self) -> &[ClickableObject] {
        &self.objects
    }

    pub fn active_object(&self) -> Option<&ClickableObject> {
        match self.screen {
            Screen::Question { active } => self.objects.get(active),
            _ => None,
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn door(&self) -> Bounds {
        self.rules.door
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn solved_ids(&self) -> &BTreeSet<String> {
        &self.solved
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn expected_code(&self) -> &str {
        &self.expected_code
    }

    /// The door code as far as the player has uncovered it, `_` for every
    /// letter still hidden.
    pub fn visible_code(&self) -> Vec<&str> {
        self.objects
            .iter()
            .map(|o| if o.solved { o.question.letter.as_str() } else { "_" })
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.objects.iter().filter(|o| !o.solved).count()
    }

    pub fn all_solved(&self) -> bool {
        self.remaining() == 0
    }

    pub fn toast_at(&self, now: Instant) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|t| now < t.until)
            .map(|t| t.text.as_str())
    }

    pub fn flashing_at(&self, now: Instant) -> bool {
        self.flash_until.is_some_and(|until| now < until)
    }

    pub fn handle(&mut self, input: Input, now: Instant) -> Flow {
        match input {
            Input::Key(key) => self.handle_key(key, now),
            Input::Click(point) => {
                self.handle_click(point, now);
                Flow::Continue
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => return Flow::Quit,
            KeyCode::F(3) => {
                self.debug = !self.debug;
                let text = if self.debug { "DEBUG: ON" } else { "DEBUG: OFF" };
                self.show_toast(text, self.rules.debug_toast, now);
                return Flow::Continue;
            }
            KeyCode::Char('r') | KeyCode::Char('R')
                if ctrl || !matches!(self.screen, Screen::Lock { .. }) =>
            {
                self.reset(now);
                return Flow::Continue;
            }
            KeyCode::Esc => {
                return match self.screen {
                    Screen::Question { .. } | Screen::Lock { .. } => {
                        self.screen = Screen::Room;
                        Flow::Continue
                    }
                    Screen::Room | Screen::Won | Screen::Lost => Flow::Quit,
                };
            }
            _ => {}
        }

        match &mut self.screen {
            Screen::Question { active } => {
                if let KeyCode::Char(c @ '1'..='4') = key.code {
                    let active = *active;
                    self.choose(active, c as usize - '1' as usize, now);
                }
            }
            Screen::Lock { input } => match key.code {
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Enter => self.submit_code(now),
                KeyCode::Char(c) if !ctrl && !c.is_control() => {
                    let limit = self.expected_code.chars().count() + 4;
                    if input.chars().count() < limit {
                        input.push(c);
                    }
                }
                _ => {}
            },
            Screen::Room | Screen::Won | Screen::Lost => {}
        }
        Flow::Continue
    }

    fn handle_click(&mut self, point: Point, now: Instant) {
        if self.debug {
            log::info!("click at ({}, {}) on {:?}", point.x, point.y, self.screen);
        }

        match self.screen {
            Screen::Room => {
                if self.rules.door.contains(point) {
                    self.enter_door(now);
                    return;
                }
                if let Some(index) = self.objects.iter().position(|o| o.contains(point)) {
                    if self.objects[index].solved {
                        self.show_toast("Already solved.", self.rules.toast, now);
                    } else {
                        self.screen = Screen::Question { active: index };
                    }
                }
            }
            Screen::Question { active } => {
                if let Some(choice) = (0..ANSWER_BUTTONS).find(|&i| answer_button(i).contains(point)) {
                    self.choose(active, choice, now);
                }
            }
            Screen::Lock { .. } | Screen::Won | Screen::Lost => {}
        }
    }

    fn enter_door(&mut self, now: Instant) {
        if self.all_solved() {
            self.screen = Screen::Lock {
                input: String::new(),
            };
        } else {
            let text = format!(
                "The door is locked. Solve every task ({}/{} missing).",
                self.remaining(),
                self.objects.len()
            );
            self.show_toast(&text, self.rules.toast, now);
        }
    }

    /// Answers the active question with `choice`; choices past the end of
    /// the question's list are ignored.
    fn choose(&mut self, active: usize, choice: usize, now: Instant) {
        let Some(object) = self.objects.get_mut(active) else {
            return;
        };
        if choice >= object.question.choices.len() {
            return;
        }

        if choice == object.question.correct {
            let letter = object.question.letter.clone();
            if !object.solved {
                object.solved = true;
                self.solved.insert(object.question.id.clone());
                log::info!("solved {:?}, letter {:?}", object.question.id, letter);
                self.persist();
            }
            self.show_toast(&format!("Correct! Letter: {}", letter), self.rules.toast, now);
            self.screen = Screen::Room;
        } else {
            self.screen = Screen::Room;
            self.register_mistake("Wrong answer", now);
        }
    }

    fn submit_code(&mut self, now: Instant) {
        let Screen::Lock { input } = &mut self.screen else {
            return;
        };
        if input.to_uppercase() == self.expected_code.to_uppercase() {
            log::info!("door opened with {} mistakes", self.mistakes);
            self.screen = Screen::Won;
        } else {
            input.clear();
            self.register_mistake("Wrong code", now);
        }
    }

    fn register_mistake(&mut self, reason: &str, now: Instant) {
        self.mistakes += 1;
        self.flash_until = Some(now + self.rules.flash);
        let text = format!("{} (mistakes: {}/{})", reason, self.mistakes, self.rules.max_mistakes);
        self.show_toast(&text, self.rules.mistake_toast, now);
        log::info!("{}", text);
        self.persist();
        if self.mistakes >= self.rules.max_mistakes {
            log::info!("out of lives");
            self.screen = Screen::Lost;
        }
    }

    /// Back to a fresh game: progress file deleted, every object unsolved.
    pub fn reset(&mut self, now: Instant) {
        if let Err(e) = self.store.reset() {
            log::warn!("could not delete {}: {e}", self.store.path().display());
        }
        for object in &mut self.objects {
            object.solved = false;
        }
        self.solved.clear();
        self.mistakes = 0;
        self.flash_until = None;
        self.screen = Screen::Room;
        self.show_toast("Reset done.", self.rules.toast, now);
        log::info!("progress reset");
    }

    fn show_toast(&mut self, text: &str, duration: std::time::Duration, now: Instant) {
        self.toast = Some(Toast {
            text: text.to_string(),
            until: now + duration,
        });
    }

    fn persist(&self) {
        let progress = Progress {
            solved: self.solved.clone(),
            mistakes: self.mistakes,
        };
        if let Err(e) = self.store.save(&progress) {
            log::warn!("could not save {}: {e}", self.store.path().display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Question;
    use std::time::Duration;
    use tempfile::TempDir;

    fn question(id: &str, x: i32, letter: &str) -> Question {
        Question {
            id: id.into(),
            name: id.into(),
            x,
            y: 100,
            image: None,
            scale: 1.0,
            text: "Mida see prindib?".into(),
            code: "print(1)".into(),
            choices: vec!["0".into(), "1".into(), "2".into(), "3".into()],
            correct: 1,
            letter: letter.into(),
        }
    }

    fn objects() -> Vec<ClickableObject> {
        vec![
            ClickableObject::new(question("arvuti", 50, "A"), None),
            ClickableObject::new(question("gloobus", 250, "B"), None),
        ]
    }

    fn rules() -> Rules {
        Rules {
            flash: Duration::from_millis(10),
            toast: Duration::from_millis(20),
            mistake_toast: Duration::from_millis(20),
            debug_toast: Duration::from_millis(20),
            ..Rules::default()
        }
    }

    fn session(dir: &TempDir) -> Session {
        Session::new(objects(), rules(), store(dir))
    }

    fn store(dir: &TempDir) -> ProgressStore {
        ProgressStore::new(dir.path().join("salvestus.json"))
    }

    fn key(code: KeyCode) -> Input {
        Input::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn click(x: i32, y: i32) -> Input {
        Input::Click(Point::new(x, y))
    }

    fn door_click(s: &Session) -> Input {
        let door = s.door();
        click(door.x + 1, door.y + 1)
    }

    fn open(s: &mut Session, index: usize, now: Instant) {
        let b = s.objects()[index].bounds;
        s.handle(click(b.x + 1, b.y + 1), now);
        assert_eq!(s.screen(), &Screen::Question { active: index });
    }

    fn solve(s: &mut Session, index: usize, now: Instant) {
        open(s, index, now);
        s.handle(key(KeyCode::Char('2')), now);
    }

    fn type_code(s: &mut Session, code: &str, now: Instant) {
        for c in code.chars() {
            s.handle(key(KeyCode::Char(c)), now);
        }
    }

    #[test]
    fn clicking_unsolved_object_opens_question() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        open(&mut s, 1, Instant::now());
        assert_eq!(s.active_object().unwrap().question.id, "gloobus");
    }

    #[test]
    fn clicking_empty_floor_does_nothing() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        s.handle(click(5, 590), now);
        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(s.toast_at(now), None);
    }

    #[test]
    fn correct_answer_reveals_letter_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 1, now);

        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(s.visible_code().concat(), "_B");
        assert_eq!(s.toast_at(now), Some("Correct! Letter: B"));
        assert!(store(&dir).load().solved.contains("gloobus"));
    }

    #[test]
    fn clicking_answer_button_counts_as_choice() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        open(&mut s, 0, now);
        let button = answer_button(1);
        s.handle(click(button.x + 5, button.y + 5), now);
        assert!(s.objects()[0].solved);
    }

    #[test]
    fn solved_object_only_toasts() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);

        let b = s.objects()[0].bounds;
        s.handle(click(b.x + 1, b.y + 1), now);
        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(s.toast_at(now), Some("Already solved."));
    }

    #[test]
    fn wrong_answer_returns_to_room_with_one_mistake() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        open(&mut s, 0, now);
        s.handle(key(KeyCode::Char('4')), now);

        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(s.mistakes(), 1);
        assert!(!s.objects()[0].solved);
        assert!(s.flashing_at(now));
        assert!(!s.flashing_at(now + Duration::from_millis(10)));
        assert_eq!(s.toast_at(now), Some("Wrong answer (mistakes: 1/3)"));
        assert_eq!(store(&dir).load().mistakes, 1);
    }

    #[test]
    fn choice_beyond_available_answers_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut q = question("vihik", 50, "V");
        q.choices.truncate(2);
        let mut s = Session::new(vec![ClickableObject::new(q, None)], rules(), store(&dir));
        let now = Instant::now();
        open(&mut s, 0, now);
        s.handle(key(KeyCode::Char('3')), now);
        assert_eq!(s.screen(), &Screen::Question { active: 0 });
        assert_eq!(s.mistakes(), 0);
    }

    #[test]
    fn escape_cancels_question_without_penalty() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        open(&mut s, 0, now);
        assert_eq!(s.handle(key(KeyCode::Esc), now), Flow::Continue);
        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(s.mistakes(), 0);
    }

    #[test]
    fn locked_door_names_remaining_count() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);
        let click = door_click(&s);
        s.handle(click, now);

        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(
            s.toast_at(now),
            Some("The door is locked. Solve every task (1/2 missing).")
        );
    }

    #[test]
    fn door_code_is_independent_of_solve_order() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 1, now);
        solve(&mut s, 0, now);
        assert_eq!(s.visible_code().concat(), "AB");
        assert_eq!(s.expected_code(), "AB");
    }

    #[test]
    fn correct_code_in_any_case_wins() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);
        solve(&mut s, 1, now);
        let click = door_click(&s);
        s.handle(click, now);
        assert!(matches!(s.screen(), Screen::Lock { .. }));

        type_code(&mut s, "ab", now);
        s.handle(key(KeyCode::Enter), now);
        assert_eq!(s.screen(), &Screen::Won);
        assert_eq!(s.handle(key(KeyCode::Esc), now), Flow::Quit);
    }

    #[test]
    fn wrong_code_clears_buffer_and_counts_mistake() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);
        solve(&mut s, 1, now);
        let click = door_click(&s);
        s.handle(click, now);

        type_code(&mut s, "ABX", now);
        s.handle(key(KeyCode::Enter), now);
        assert_eq!(s.screen(), &Screen::Lock { input: String::new() });
        assert_eq!(s.mistakes(), 1);
        assert_eq!(s.toast_at(now), Some("Wrong code (mistakes: 1/3)"));
    }

    #[test]
    fn lock_input_is_bounded_and_editable() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);
        solve(&mut s, 1, now);
        let click = door_click(&s);
        s.handle(click, now);

        type_code(&mut s, "abcdefghij", now);
        assert_eq!(s.screen(), &Screen::Lock { input: "abcdef".into() });
        s.handle(key(KeyCode::Backspace), now);
        assert_eq!(s.screen(), &Screen::Lock { input: "abcde".into() });
    }

    #[test]
    fn letter_r_is_code_input_inside_lock() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);
        solve(&mut s, 1, now);
        let click = door_click(&s);
        s.handle(click, now);

        s.handle(key(KeyCode::Char('r')), now);
        assert_eq!(s.screen(), &Screen::Lock { input: "r".into() });
        assert!(s.all_solved());
    }

    #[test]
    fn third_wrong_code_loses() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);
        solve(&mut s, 1, now);
        let click = door_click(&s);

        for expected in 1..=3 {
            s.handle(click.clone(), now);
            type_code(&mut s, "zz", now);
            s.handle(key(KeyCode::Enter), now);
            assert_eq!(s.mistakes(), expected);
            if expected < 3 {
                assert!(matches!(s.screen(), Screen::Lock { .. }));
                s.handle(key(KeyCode::Esc), now);
            }
        }
        assert_eq!(s.screen(), &Screen::Lost);
        assert_eq!(store(&dir).load().mistakes, 3);
    }

    #[test]
    fn wrong_answers_alone_can_lose() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        for _ in 0..3 {
            open(&mut s, 0, now);
            s.handle(key(KeyCode::Char('1')), now);
        }
        assert_eq!(s.screen(), &Screen::Lost);
        assert!(s.active_object().is_none());
    }

    #[test]
    fn progress_is_restored_on_start() {
        let dir = TempDir::new().unwrap();
        store(&dir)
            .save(&Progress {
                solved: ["gloobus".to_string(), "kustutatud".to_string()].into_iter().collect(),
                mistakes: 2,
            })
            .unwrap();

        let s = session(&dir);
        assert_eq!(s.visible_code().concat(), "_B");
        assert_eq!(s.mistakes(), 2);
        assert_eq!(s.solved_ids().len(), 1);
        assert!(s.objects()[1].solved);
    }

    #[test]
    fn reset_clears_everything() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);
        open(&mut s, 1, now);
        s.handle(key(KeyCode::Char('1')), now);
        assert!(store(&dir).path().exists());

        s.handle(key(KeyCode::Char('r')), now);
        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(s.mistakes(), 0);
        assert!(s.solved_ids().is_empty());
        assert!(s.objects().iter().all(|o| !o.solved));
        assert!(!s.flashing_at(now));
        assert!(!store(&dir).path().exists());
        assert_eq!(store(&dir).load(), Progress::default());
    }

    #[test]
    fn ctrl_r_resets_from_lock() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);
        solve(&mut s, 1, now);
        let click = door_click(&s);
        s.handle(click, now);

        s.handle(
            Input::Key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            now,
        );
        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(s.remaining(), 2);
    }

    #[test]
    fn debug_toggle_toasts_and_expires() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        s.handle(key(KeyCode::F(3)), now);
        assert!(s.debug());
        assert_eq!(s.toast_at(now), Some("DEBUG: ON"));
        assert_eq!(s.toast_at(now + Duration::from_millis(20)), None);
        s.handle(key(KeyCode::F(3)), now);
        assert!(!s.debug());
    }

    #[test]
    fn escape_in_room_quits() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        assert_eq!(s.handle(key(KeyCode::Esc), Instant::now()), Flow::Quit);
    }

    #[test]
    fn escape_from_lock_returns_to_room_and_drops_input() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        let now = Instant::now();
        solve(&mut s, 0, now);
        solve(&mut s, 1, now);
        let click = door_click(&s);
        s.handle(click.clone(), now);
        type_code(&mut s, "ab", now);

        assert_eq!(s.handle(key(KeyCode::Esc), now), Flow::Continue);
        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(s.mistakes(), 0);

        s.handle(click, now);
        assert_eq!(s.screen(), &Screen::Lock { input: String::new() });
    }

    #[test]
    fn saved_game_at_max_mistakes_starts_lost() {
        let dir = TempDir::new().unwrap();
        store(&dir)
            .save(&Progress {
                solved: BTreeSet::new(),
                mistakes: 3,
            })
            .unwrap();

        let mut s = session(&dir);
        assert_eq!(s.screen(), &Screen::Lost);

        s.handle(key(KeyCode::Char('r')), Instant::now());
        assert_eq!(s.screen(), &Screen::Room);
        assert_eq!(s.mistakes(), 0);
        assert!(!store(&dir).path().exists());
    }

    #[test]
    fn empty_room_opens_door_and_empty_code_wins() {
        let dir = TempDir::new().unwrap();
        let mut s = Session::new(vec![], rules(), store(&dir));
        let now = Instant::now();
        assert_eq!(s.expected_code(), "");

        let click = door_click(&s);
        s.handle(click, now);
        assert_eq!(s.screen(), &Screen::Lock { input: String::new() });
        s.handle(key(KeyCode::Enter), now);
        assert_eq!(s.screen(), &Screen::Won);
    }
}
