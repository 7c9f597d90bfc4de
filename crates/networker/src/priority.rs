//! Queue ordering score for requests. Higher scores are serviced first.

use shared::domain::Classification;

use crate::request::{NetRequest, RequestKind};

const QUIT_BASE: i32 = 200;
const WRITE_BASE: i32 = 100;
const READ_BASE: i32 = 90;

const DEFAULT_BONUS: i32 = 9;
const BULK_CONTENT_BONUS: i32 = 8;
const PLAIN_IMAGE_BONUS: i32 = 1;

pub fn priority(request: &NetRequest) -> i32 {
    score(request.kind(), request.classification())
}

pub fn score(kind: RequestKind, classification: Classification) -> i32 {
    base_score(kind) + classification_bonus(classification)
}

fn base_score(kind: RequestKind) -> i32 {
    match kind {
        RequestKind::Quit => QUIT_BASE,
        RequestKind::Put | RequestKind::Post | RequestKind::PostJson | RequestKind::Patch => {
            WRITE_BASE
        }
        RequestKind::Get => READ_BASE,
        // `Nothing` never reaches a queue. Deletes and octet uploads rank
        // below every read.
        RequestKind::Nothing | RequestKind::Delete | RequestKind::PutOctets => 0,
    }
}

fn classification_bonus(classification: Classification) -> i32 {
    if classification.is_bulk_content() {
        BULK_CONTENT_BONUS
    } else if classification.is_plain_image() {
        PLAIN_IMAGE_BONUS
    } else {
        DEFAULT_BONUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAGS: [Classification; 9] = [
        Classification::DEFAULT,
        Classification::MESSAGES,
        Classification::GUILD,
        Classification::IMAGE,
        Classification::IMAGE_ATTACHMENT,
        Classification::PROFILE,
        Classification::PINS,
        Classification::ATTACHMENT_UPLOAD,
        Classification(-12),
    ];

    const WRITES: [RequestKind; 4] = [
        RequestKind::Put,
        RequestKind::Post,
        RequestKind::PostJson,
        RequestKind::Patch,
    ];

    #[test]
    fn exact_scores() {
        assert_eq!(score(RequestKind::Quit, Classification::DEFAULT), 209);
        assert_eq!(score(RequestKind::PostJson, Classification::MESSAGES), 108);
        assert_eq!(score(RequestKind::Get, Classification::IMAGE), 91);
        assert_eq!(score(RequestKind::Get, Classification::GUILD), 98);
        assert_eq!(score(RequestKind::Get, Classification(555)), 99);
        assert_eq!(score(RequestKind::Delete, Classification::DEFAULT), 9);
        assert_eq!(score(RequestKind::PutOctets, Classification::IMAGE), 1);
    }

    #[test]
    fn quit_beats_writes_beat_reads_for_any_tags() {
        for a in TAGS {
            for b in TAGS {
                for write in WRITES {
                    assert!(score(RequestKind::Quit, a) > score(write, b));
                    assert!(score(write, a) > score(RequestKind::Get, b));
                }
            }
        }
    }

    #[test]
    fn plain_images_rank_below_bulk_content_below_default() {
        assert!(PLAIN_IMAGE_BONUS < BULK_CONTENT_BONUS);
        assert!(BULK_CONTENT_BONUS < DEFAULT_BONUS);
        assert_eq!(classification_bonus(Classification::IMAGE), PLAIN_IMAGE_BONUS);
        assert_eq!(
            classification_bonus(Classification::IMAGE_ATTACHMENT),
            BULK_CONTENT_BONUS
        );
        assert_eq!(classification_bonus(Classification::PINS), DEFAULT_BONUS);
    }
}
