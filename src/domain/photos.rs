use crate::domain::messages::WidgetAction;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

pub const JUMP_SIZE: i64 = 10;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoWidgetState {
    pub url: Option<String>,
    pub index: usize,
    pub total: usize,
    pub auto_advance: bool,
}

/// Shuffled slideshow for the photos widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRotation {
    photos: Vec<String>,
    current: usize,
    auto_advance: bool,
}

impl PhotoRotation {
    pub fn shuffled<R: Rng + ?Sized>(mut photos: Vec<String>, rng: &mut R) -> Self {
        photos.shuffle(rng);
        Self::in_order(photos)
    }

    pub fn in_order(photos: Vec<String>) -> Self {
        Self {
            photos,
            current: 0,
            auto_advance: true,
        }
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    /// Moving before the first photo lands on the last one, moving past the
    /// last lands on the first. Jumps do not carry the remainder over.
    pub fn show(&mut self, index: i64) {
        if self.photos.is_empty() {
            return;
        }
        let last = self.photos.len() as i64 - 1;
        self.current = if index < 0 {
            last as usize
        } else if index > last {
            0
        } else {
            index as usize
        };
    }

    pub fn next(&mut self) {
        self.show(self.current as i64 + 1);
    }

    pub fn previous(&mut self) {
        self.show(self.current as i64 - 1);
    }

    pub fn apply(&mut self, action: WidgetAction) {
        let current = self.current as i64;
        match action {
            WidgetAction::Right => self.next(),
            WidgetAction::Left => self.previous(),
            WidgetAction::Up => self.show(current + JUMP_SIZE),
            WidgetAction::Down => self.show(current - JUMP_SIZE),
            WidgetAction::Enter => self.auto_advance = !self.auto_advance,
        }
    }

    /// Advances on the transition timer. Returns false when paused or empty.
    pub fn auto_advance_tick(&mut self) -> bool {
        if !self.auto_advance || self.photos.is_empty() {
            return false;
        }
        self.next();
        true
    }

    /// Current photo URL with a `t=<millis>` query so the browser refetches it.
    pub fn current_url(&self, now: DateTime<Utc>) -> Option<String> {
        let base = self.photos.get(self.current)?;
        let separator = if base.contains('?') { '&' } else { '?' };
        Some(format!("{base}{separator}t={}", now.timestamp_millis()))
    }

    pub fn state(&self, now: DateTime<Utc>) -> PhotoWidgetState {
        PhotoWidgetState {
            url: self.current_url(now),
            index: self.current,
            total: self.photos.len(),
            auto_advance: self.auto_advance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rotation(count: usize) -> PhotoRotation {
        PhotoRotation::in_order(
            (0..count)
                .map(|index| format!("photos/{index}.jpg"))
                .collect(),
        )
    }

    #[test]
    fn shuffle_keeps_every_photo() {
        let photos: Vec<String> = (0..20).map(|index| format!("{index}.jpg")).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let rotation = PhotoRotation::shuffled(photos.clone(), &mut rng);

        let mut shuffled = rotation.photos.clone();
        shuffled.sort();
        let mut expected = photos;
        expected.sort();
        assert_eq!(shuffled, expected);
        assert_eq!(rotation.current, 0);
    }

    #[test]
    fn wraps_at_both_ends() {
        let mut rotation = rotation(3);
        rotation.apply(WidgetAction::Left);
        assert_eq!(rotation.current, 2);
        rotation.apply(WidgetAction::Right);
        assert_eq!(rotation.current, 0);
    }

    #[test]
    fn jumps_reset_to_the_opposite_end_when_out_of_range() {
        let mut rotation = rotation(25);
        rotation.apply(WidgetAction::Up);
        assert_eq!(rotation.current, 10);
        rotation.apply(WidgetAction::Up);
        assert_eq!(rotation.current, 20);
        rotation.apply(WidgetAction::Up);
        assert_eq!(rotation.current, 0);
        rotation.apply(WidgetAction::Down);
        assert_eq!(rotation.current, 24);
    }

    #[test]
    fn enter_pauses_auto_advance() {
        let mut rotation = rotation(2);
        assert!(rotation.auto_advance_tick());
        assert_eq!(rotation.current, 1);

        rotation.apply(WidgetAction::Enter);
        assert!(!rotation.auto_advance_tick());
        assert_eq!(rotation.current, 1);
    }

    #[test]
    fn url_carries_cache_buster() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc);
        let mut rotation = PhotoRotation::in_order(vec![
            "photos/a.jpg".to_string(),
            "https://cdn.example.com/b.jpg?size=large".to_string(),
        ]);
        let millis = now.timestamp_millis();
        assert_eq!(
            rotation.current_url(now),
            Some(format!("photos/a.jpg?t={millis}"))
        );
        rotation.next();
        assert_eq!(
            rotation.current_url(now),
            Some(format!("https://cdn.example.com/b.jpg?size=large&t={millis}"))
        );
    }

    #[test]
    fn empty_rotation_is_inert() {
        let mut rotation = rotation(0);
        rotation.apply(WidgetAction::Right);
        assert!(!rotation.auto_advance_tick());
        assert_eq!(rotation.state(Utc::now()).url, None);
    }
}
