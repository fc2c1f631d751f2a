//! Recipe input rules, shared by create and update.

use crate::api::validation::{required_text, Validation};
use crate::models::RecipeFields;
use serde::Deserialize;
use utoipa::ToSchema;

pub const MAX_INGREDIENTS: usize = 50;
pub const MAX_MINUTES: i32 = 1440;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientRequest {
    pub name: String,
    pub measurement: String,
    pub substitution_option: Option<String>,
    pub allergen_info: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipeRequest {
    pub title: String,
    pub short_description: String,
    pub cuisine_type: String,
    pub category: String,
    /// Minutes, 1 to 1440
    pub prep_time: i32,
    /// Minutes, 0 to 1440
    pub cook_time: i32,
    pub serving_size: i32,
    pub preparation_notes: Option<String>,
    pub ingredients: Vec<IngredientRequest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidIngredient<'a> {
    pub name: &'a str,
    pub measurement: &'a str,
    pub substitution_option: Option<&'a str>,
    pub allergen_info: Option<&'a str>,
}

/// A request that passed every rule, with text trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecipe<'a> {
    pub fields: RecipeFields<'a>,
    pub preparation_notes: Option<&'a str>,
    pub ingredients: Vec<ValidIngredient<'a>>,
}

fn length_between<'a>(field: &str, value: &'a str, min: usize, max: usize) -> Validation<&'a str> {
    let value = required_text(field, value, max)?;
    if value.chars().count() < min {
        return Err(format!("The {} must be at least {} characters.", field, min));
    }
    Ok(value)
}

fn in_range(field: &str, value: i32, min: i32, max: i32) -> Validation<i32> {
    if value < min || value > max {
        return Err(format!("The {} must be between {} and {}.", field, min, max));
    }
    Ok(value)
}

/// Blank optional text becomes `None`.
fn optional_text<'a>(field: &str, value: Option<&'a str>, max: usize) -> Validation<Option<&'a str>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => required_text(field, v, max).map(Some),
        None => Ok(None),
    }
}

fn validate_ingredient(i: &IngredientRequest) -> Validation<ValidIngredient<'_>> {
    Ok(ValidIngredient {
        name: required_text("ingredient name", &i.name, 255)?,
        measurement: required_text("ingredient measurement", &i.measurement, 50)?,
        substitution_option: optional_text(
            "substitution option",
            i.substitution_option.as_deref(),
            255,
        )?,
        allergen_info: optional_text("allergen info", i.allergen_info.as_deref(), 255)?,
    })
}

pub fn validate_recipe(req: &RecipeRequest) -> Validation<ValidRecipe<'_>> {
    let title = length_between("title", &req.title, 3, 255)?;
    let short_description = length_between("short description", &req.short_description, 10, 500)?;
    let cuisine_type = required_text("cuisine type", &req.cuisine_type, 100)?;
    let category = required_text("category", &req.category, 100)?;
    let prep_time = in_range("prep time", req.prep_time, 1, MAX_MINUTES)?;
    let cook_time = in_range("cook time", req.cook_time, 0, MAX_MINUTES)?;
    let serving_size = in_range("serving size", req.serving_size, 1, 100)?;

    let preparation_notes = match optional_text("preparation notes", req.preparation_notes.as_deref(), 10_000)? {
        Some(notes) if notes.chars().count() < 20 => {
            return Err("The preparation notes must be at least 20 characters.".to_string())
        }
        notes => notes,
    };

    if req.ingredients.is_empty() {
        return Err("At least one ingredient is required.".to_string());
    }
    if req.ingredients.len() > MAX_INGREDIENTS {
        return Err(format!(
            "A recipe may not have more than {} ingredients.",
            MAX_INGREDIENTS
        ));
    }
    let ingredients = req
        .ingredients
        .iter()
        .map(validate_ingredient)
        .collect::<Validation<Vec<_>>>()?;

    Ok(ValidRecipe {
        fields: RecipeFields {
            title,
            short_description,
            cuisine_type,
            category,
            prep_time,
            cook_time,
            total_time: prep_time + cook_time,
            serving_size,
        },
        preparation_notes,
        ingredients,
    })
}
