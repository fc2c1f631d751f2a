use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub short_description: String,
    pub cuisine_type: String,
    pub category: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub total_time: i32,
    pub serving_size: i32,
    pub preparation_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::recipes)]
pub struct RecipeFields<'a> {
    pub title: &'a str,
    pub short_description: &'a str,
    pub cuisine_type: &'a str,
    pub category: &'a str,
    pub prep_time: i32,
    pub cook_time: i32,
    pub total_time: i32,
    pub serving_size: i32,
}

// preparation_notes stays outside RecipeFields: AsChangeset would skip a None
// instead of clearing the column.
#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub user_id: Uuid,
    #[diesel(embed)]
    pub fields: RecipeFields<'a>,
    pub preparation_notes: Option<&'a str>,
}

#[derive(Queryable, Selectable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = crate::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ingredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub name: String,
    pub measurement: String,
    pub substitution_option: Option<String>,
    pub allergen_info: Option<String>,
    pub position: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ingredients)]
pub struct NewIngredient<'a> {
    pub recipe_id: Uuid,
    pub name: &'a str,
    pub measurement: &'a str,
    pub substitution_option: Option<&'a str>,
    pub allergen_info: Option<&'a str>,
    pub position: i32,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub user_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::comments)]
pub struct NewComment<'a> {
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Rating {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub user_id: Option<Uuid>,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ratings)]
pub struct NewRating {
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::saved_recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SavedRecipe {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::saved_recipes)]
pub struct NewSavedRecipe {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
}
