//! Resource shapes served by the demo REST API

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type UserId = u64;
pub type PostId = u64;
pub type CommentId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    #[serde(default, rename = "catchPhrase")]
    pub catch_phrase: String,
}

/// A remote user, shown as a potential team member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Body for creating or replacing a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: UserId,
    pub title: String,
    pub body: String,
}

impl NewPost {
    pub fn new(user_id: UserId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Title and body are both required before anything is sent
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.body.trim().is_empty() {
            return Err(Error::Validation(
                "post title and body are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post_id: PostId,
    pub name: String,
    pub email: String,
    pub body: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.body.trim().is_empty() {
            return Err(Error::Validation(
                "comment name and body are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_parses_api_shape() {
        let json = r#"{
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": {"street": "Kulas Light", "city": "Gwenborough"},
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "company": {"name": "Romaguera-Crona", "catchPhrase": "Multi-layered client-server neural-net", "bs": "harness"}
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.username, "Bret");
        assert_eq!(
            user.company.unwrap().catch_phrase,
            "Multi-layered client-server neural-net"
        );
    }

    #[test]
    fn test_post_uses_camel_case() {
        let post: Post =
            serde_json::from_str(r#"{"userId": 3, "id": 21, "title": "t", "body": "b"}"#).unwrap();
        assert_eq!(post.user_id, 3);

        let body = serde_json::to_value(NewPost::new(1, "Hello", "World")).unwrap();
        assert_eq!(body["userId"], 1);
    }

    #[test]
    fn test_new_post_requires_title_and_body() {
        assert!(NewPost::new(1, "", "body").validate().is_err());
        assert!(NewPost::new(1, "title", " ").validate().is_err());
        assert!(NewPost::new(1, "title", "body").validate().is_ok());
    }
}
