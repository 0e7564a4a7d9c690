use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChapterRequest {
    pub subject_id: i64,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateChapterRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    pub chapter_id: i64,
    pub date_of_quiz: NaiveDate,
    #[validate(range(min = 1, message = "Duration must be positive"))]
    pub time_duration: i32,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    pub date_of_quiz: Option<NaiveDate>,
    #[validate(range(min = 1, message = "Duration must be positive"))]
    pub time_duration: Option<i32>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub quiz_id: i64,
    #[validate(length(min = 1))]
    pub question_statement: String,
    #[validate(length(min = 1, max = 200))]
    pub option1: String,
    #[validate(length(min = 1, max = 200))]
    pub option2: String,
    #[validate(length(min = 1, max = 200))]
    pub option3: String,
    #[validate(length(min = 1, max = 200))]
    pub option4: String,
    #[validate(range(min = 1, max = 4, message = "Correct option must be between 1 and 4"))]
    pub correct_option: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1))]
    pub question_statement: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub option1: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub option2: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub option3: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub option4: Option<String>,
    #[validate(range(min = 1, max = 4, message = "Correct option must be between 1 and 4"))]
    pub correct_option: Option<i32>,
}
