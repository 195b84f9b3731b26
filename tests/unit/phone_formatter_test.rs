//! Property tests for the phone mask

use lead_gateway::services::phone_formatter::{digits, format, split};
use proptest::prelude::*;

proptest! {
    #[test]
    fn format_keeps_every_digit(raw in "[0-9]{0,11}") {
        let formatted = format(&raw);
        let kept: String = formatted.chars().filter(|c| c.is_ascii_digit()).collect();
        prop_assert_eq!(kept, raw);
    }

    #[test]
    fn format_is_idempotent(raw in "[0-9]{0,11}") {
        let once = format(&raw);
        prop_assert_eq!(format(&once), once);
    }

    #[test]
    fn mask_shape_follows_length(raw in "[0-9]{0,11}") {
        let formatted = format(&raw);
        match raw.len() {
            0..=2 => prop_assert_eq!(formatted, raw),
            3..=7 => {
                prop_assert!(formatted.starts_with('('));
                prop_assert!(!formatted.contains('-'));
            }
            _ => {
                let prefix = format!("({}) ", &raw[..2]);
                prop_assert!(formatted.starts_with(&prefix));
                prop_assert!(formatted.contains('-'));
            }
        }
    }

    #[test]
    fn noise_is_ignored(raw in "[0-9]{0,11}", noise in "[ ()+.-]{0,4}") {
        let noisy = format!("{}{}", noise, raw);
        prop_assert_eq!(format(&noisy), format(&raw));
    }

    #[test]
    fn digits_are_capped(raw in "[0-9]{0,20}") {
        prop_assert!(digits(&raw).len() <= 11);
    }

    #[test]
    fn split_rejoins(raw in "[0-9]{3,11}") {
        let (ddd, number) = split(&raw).unwrap();
        prop_assert_eq!(ddd.len(), 2);
        prop_assert_eq!(format!("{}{}", ddd, number), raw);
    }
}

#[test]
fn test_length_boundaries() {
    let cases = [
        ("", ""),
        ("11", "11"),
        ("119", "(11) 9"),
        ("119876", "(11) 9876"),
        ("1198765", "(11) 98765"),
        ("11987654", "(11) 98765-4"),
        ("1134567890", "(11) 3456-7890"),
        ("11987654321", "(11) 98765-4321"),
    ];

    for (raw, expected) in cases {
        assert_eq!(format(raw), expected, "raw input {:?}", raw);
    }
}
