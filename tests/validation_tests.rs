use chrono::NaiveTime;
use dasbot::utils::validation::*;

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn labels() -> Vec<String> {
    vec!["der".into(), "die".into(), "das".into()]
}

#[test]
fn test_parse_time_slot() {
    assert_eq!(parse_time_slot("09:00").unwrap(), hm(9, 0));
    assert_eq!(parse_time_slot(" 21:30 ").unwrap(), hm(21, 30));
    assert_eq!(parse_time_slot("00:00").unwrap(), hm(0, 0));

    assert!(parse_time_slot("").is_err());
    assert!(parse_time_slot("24:00").is_err());
    assert!(parse_time_slot("9am").is_err());
    assert!(parse_time_slot("UNSUBSCRIBE").is_err());
}

#[test]
fn test_parse_time_slots() {
    assert_eq!(
        parse_time_slots("09:00, 12:00,,21:00").unwrap(),
        vec![hm(9, 0), hm(12, 0), hm(21, 0)]
    );

    assert!(parse_time_slots("").is_err());
    assert!(parse_time_slots("09:00,09:00").is_err());
    assert!(parse_time_slots("09:00,noon").is_err());
}

#[test]
fn test_validate_quiz_length() {
    assert!(validate_quiz_length(1).is_ok());
    assert!(validate_quiz_length(50).is_ok());
    assert!(validate_quiz_length(100).is_ok());

    assert!(validate_quiz_length(0).is_err());
    assert!(validate_quiz_length(101).is_err());
}

#[test]
fn test_parse_quiz_lengths() {
    assert_eq!(parse_quiz_lengths("5,10,20,50").unwrap(), vec![5, 10, 20, 50]);
    // Duplicates collapse, order is kept
    assert_eq!(parse_quiz_lengths("10, 5, 10").unwrap(), vec![10, 5]);

    assert!(parse_quiz_lengths("").is_err());
    assert!(parse_quiz_lengths("5,-1").is_err());
    assert!(parse_quiz_lengths("5,500").is_err());
}

#[test]
fn test_parse_answer_labels() {
    assert_eq!(parse_answer_labels("der,die,das").unwrap(), labels());
    assert_eq!(parse_answer_labels(" DER , Die , das ").unwrap(), labels());

    assert!(parse_answer_labels("der,die").is_err());
    assert!(parse_answer_labels("der,die,das,den").is_err());
    assert!(parse_answer_labels("der,der,das").is_err());
}

#[test]
fn test_recognize_answer() {
    let labels = labels();

    assert_eq!(recognize_answer(&labels, "der"), Some("der"));
    assert_eq!(recognize_answer(&labels, "  Die\n"), Some("die"));
    assert_eq!(recognize_answer(&labels, "DAS"), Some("das"));

    assert_eq!(recognize_answer(&labels, "dem"), None);
    assert_eq!(recognize_answer(&labels, "der Tisch"), None);
    assert_eq!(recognize_answer(&labels, ""), None);
}
