use std::io::Write;

use storage::{QuestionBank, QuestionBankError};

const BANK: &str = r#"[
  {"subject":"Math","topic":"Fractions","question":"1/2 + 1/4?","options":["3/4","2/6","1/8"],"answer":"3/4"},
  {"subject":"Science","topic":"Cells","question":"Powerhouse of the cell?","options":["Nucleus","Mitochondria"],"answer":"Mitochondria"},
  {"subject":"Math","topic":"Algebra","question":"x + 2 = 5, x?","options":["2","3","5"],"answer":"3"}
]"#;

#[test]
fn bank_assigns_positional_ids_and_lists_subjects() {
    let bank = QuestionBank::from_json_str(BANK).unwrap();
    assert_eq!(bank.len(), 3);
    assert_eq!(bank.subjects(), ["Math", "Science"]);

    let ids: Vec<_> = bank.questions().iter().map(|q| q.id().value()).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn invalid_record_reports_its_position() {
    let json = r#"[
      {"subject":"Math","topic":"T","question":"Q","options":["a","b"],"answer":"a"},
      {"subject":"Math","topic":"T","question":"Q","options":["a","b"],"answer":"z"}
    ]"#;
    let err = QuestionBank::from_json_str(json).unwrap_err();
    assert!(matches!(err, QuestionBankError::InvalidQuestion { index: 2, .. }));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = QuestionBank::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, QuestionBankError::Parse(_)));
}

#[test]
fn load_reads_from_disk() {
    let path = std::env::temp_dir().join(format!("classroom-bank-{}.json", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(BANK.as_bytes()).unwrap();
    }
    let bank = QuestionBank::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(bank.questions()[1].subject(), "Science");

    let missing = QuestionBank::load(path.with_extension("missing")).unwrap_err();
    assert!(matches!(missing, QuestionBankError::Io(_)));
}
