// Tests for the question/answer file helpers

use docqa::utils::{
    append_text_file, read_text_file, remove_empty_lines, write_text_file, TextFileError,
};
use tempfile::tempdir;

#[tokio::test]
async fn test_read_returns_file_contents() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("q.txt");
    std::fs::write(&path, "What color is the sky?").unwrap();

    let contents = read_text_file(&path).await.unwrap();
    assert_eq!(contents, "What color is the sky?");
}

#[tokio::test]
async fn test_read_missing_file_reports_not_found() {
    let dir = tempdir().unwrap();
    let err = read_text_file(dir.path().join("absent.txt")).await.unwrap_err();

    assert!(matches!(err, TextFileError::NotFound(_)));
}

#[tokio::test]
async fn test_write_overwrites_existing_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "old answer").unwrap();

    write_text_file(&path, "new answer").await;

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new answer");
}

#[tokio::test]
async fn test_append_creates_then_extends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");

    append_text_file(&path, "first").await;
    append_text_file(&path, " second").await;

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "first second");
}

#[tokio::test]
async fn test_remove_empty_lines_strips_blank_and_whitespace_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "A\n\nB\n   \nC\n").unwrap();

    remove_empty_lines(&path).await;

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "A\nB\nC\n");
}

#[tokio::test]
async fn test_remove_empty_lines_keeps_unterminated_last_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "A\n\nB").unwrap();

    remove_empty_lines(&path).await;

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "A\nB");
}

#[tokio::test]
async fn test_remove_empty_lines_preserves_line_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "\nfirst\n\t\nsecond\n\nthird\n").unwrap();

    remove_empty_lines(&path).await;

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "first\nsecond\nthird\n"
    );
}

#[tokio::test]
async fn test_remove_empty_lines_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "A\n\n\nB\n").unwrap();

    remove_empty_lines(&path).await;
    let once = std::fs::read_to_string(&path).unwrap();
    remove_empty_lines(&path).await;
    let twice = std::fs::read_to_string(&path).unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice, "A\nB\n");
}

#[tokio::test]
async fn test_remove_empty_lines_on_missing_file_is_quiet() {
    let dir = tempdir().unwrap();
    // Must not panic or create the file
    let path = dir.path().join("absent.txt");
    remove_empty_lines(&path).await;
    assert!(!path.exists());
}
