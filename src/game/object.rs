use crate::assets::Sprite;
use crate::catalog::Question;

use super::layout::{Bounds, Point};

/// Hit box size for objects whose picture could not be loaded.
pub const PLACEHOLDER_SIZE: i32 = 120;

/// One question placed in the room.
#[derive(Debug, Clone)]
pub struct ClickableObject {
    pub question: Question,
    pub bounds: Bounds,
    pub solved: bool,
    sprite: Option<Sprite>,
}

impl ClickableObject {
    pub fn new(question: Question, sprite: Option<Sprite>) -> Self {
        let (w, h) = match &sprite {
            Some(sprite) => (sprite.width() as i32, sprite.height() as i32),
            None => (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE),
        };
        let bounds = Bounds::new(question.x, question.y, w, h);
        ClickableObject {
            question,
            bounds,
            solved: false,
            sprite,
        }
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprite.as_ref()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.bounds.contains(p)
    }
}

/// Builds the room's objects in catalog order, loading each picture once.
/// An object's index is also the position of its letter in the door code.
pub fn build_objects(questions: Vec<Question>) -> Vec<ClickableObject> {
    questions
        .into_iter()
        .map(|question| {
            let sprite = question
                .image
                .as_deref()
                .and_then(|path| Sprite::load(path, question.scale));
            ClickableObject::new(question, sprite)
        })
        .collect()
}
