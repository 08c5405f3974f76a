pub mod exam_records;
pub mod user;
pub mod word_errors;
pub mod words;
