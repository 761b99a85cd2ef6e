use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: Author,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Status {
    Available,
    Sold,
}

#[derive(Debug, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author_id: u64,
}

/// List books
///
/// Every book of the shop, newest first.
/// @resource GET /books
/// @query {int} [page=1] - Page to return
/// @query {string} sort - Sort order
/// @response {[]Book} The books
pub async fn list_books() {}

/// Fetch a book
/// @resource GET /books/{id}
/// @route {uint} id - The book id
/// @response 200 {Book} The book
/// @auth
pub async fn get_book() {}

/// @resource POST /books
/// @body {NewBook}
/// @response 201 {Book} The created book
/// @auth
/// @deprecated
pub async fn create_book() {}

/// @resource DELETE /books/{id}
/// @route {uint} id - The book id
/// @response 204 {nil}
pub async fn delete_book() {}

/// List the reviews of a book
/// @resource GET /books/{id}/reviews
/// @route {uint} id - The book id
/// @response {[]Review}
pub async fn list_reviews() {}

/// @resource GET /authors/{author_id}
/// @route {uint} id - Mismatched parameter
/// @response {Author}
pub async fn get_author() {}

/// @response {Book}
pub async fn missing_resource() {}

pub struct Handlers;

impl Handlers {
    /// @resource GET /status
    /// @response {Status}
    pub fn status(&self) {}
}

/// Helper without tags
pub fn helper() {}
