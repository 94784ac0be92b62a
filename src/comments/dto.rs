use serde::Deserialize;

pub const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct NewCommentRequest {
    pub body: String,
}

impl NewCommentRequest {
    pub fn validated_body(&self) -> Result<&str, &'static str> {
        let body = self.body.trim();
        if body.is_empty() {
            return Err("Comment cannot be empty");
        }
        if body.chars().count() > MAX_COMMENT_CHARS {
            return Err("Comment must be at most 2000 characters");
        }
        Ok(body)
    }
}
