//! Recipes: CRUD restricted to owners and admins, plus image upload.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{DocId, Document};

use super::CookbookState;
use super::access::{self, Decision, Grant};
use super::auth::AuthUser;
use super::error::CookbookError;
use super::validation::required_str;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// A stored recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub name: String,
    pub ingredients: String,
    pub preparation: String,
    /// Creator.
    #[serde(rename = "userId")]
    pub user_id: DocId,
    /// Public URL of the uploaded image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Document for Recipe {
    fn id(&self) -> &DocId {
        &self.id
    }
}

/// `{ "recipe": ... }` response.
#[derive(Debug, Serialize)]
pub struct RecipeBody {
    pub recipe: Recipe,
}

/// Validated create/update body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeInput {
    pub name: String,
    pub ingredients: String,
    pub preparation: String,
}

/// Requires non-empty `name`, `ingredients` and `preparation` strings.
///
/// # Errors
///
/// Returns [`CookbookError::InvalidEntries`] on any failure.
pub fn validate_recipe(body: &Value) -> Result<RecipeInput, CookbookError> {
    Ok(RecipeInput {
        name: required_str(body, "name")?.to_string(),
        ingredients: required_str(body, "ingredients")?.to_string(),
        preparation: required_str(body, "preparation")?.to_string(),
    })
}

/// Malformed ids are reported exactly like unknown ones.
fn parse_recipe_id(raw: &str) -> Result<DocId, CookbookError> {
    raw.parse().map_err(|_| CookbookError::RecipeNotFound)
}

/// Public URL recorded for an uploaded image.
#[must_use]
pub fn image_url(host: &str, id: &DocId) -> String {
    format!("{host}/src/uploads/{id}.jpeg")
}

impl CookbookState {
    /// Stores a recipe owned by `owner`.
    pub async fn create_recipe(&self, input: RecipeInput, owner: DocId) -> Recipe {
        let recipe = Recipe {
            id: DocId::new(),
            name: input.name,
            ingredients: input.ingredients,
            preparation: input.preparation,
            user_id: owner,
            image: None,
        };
        tracing::info!(recipe = %recipe.id, owner = %recipe.user_id, "recipe created");
        self.recipes.insert(recipe).await
    }

    /// Looks a recipe up by id.
    ///
    /// # Errors
    ///
    /// Returns [`CookbookError::RecipeNotFound`] if it does not exist.
    pub async fn recipe(&self, id: &DocId) -> Result<Recipe, CookbookError> {
        self.recipes
            .find_by_id(id)
            .await
            .ok_or(CookbookError::RecipeNotFound)
    }

    /// Loads a recipe and checks that `caller` may change it.
    async fn editable_recipe(
        &self,
        id: &DocId,
        caller: &AuthUser,
    ) -> Result<(Recipe, Grant), CookbookError> {
        let recipe = self.recipe(id).await?;
        let actor = self.actor(caller).await;
        match access::authorize_recipe_change(&actor, &recipe.user_id) {
            Decision::Allow(grant) => Ok((recipe, grant)),
            Decision::Deny => {
                tracing::info!(recipe = %id, user = %caller.id, "recipe change denied");
                Err(CookbookError::Forbidden)
            }
        }
    }

    /// Replaces a recipe's fields.
    ///
    /// # Errors
    ///
    /// Returns [`CookbookError::RecipeNotFound`] or
    /// [`CookbookError::Forbidden`].
    pub async fn update_recipe(
        &self,
        id: &DocId,
        caller: &AuthUser,
        input: RecipeInput,
    ) -> Result<Recipe, CookbookError> {
        let (_, grant) = self.editable_recipe(id, caller).await?;
        let updated = self
            .recipes
            .update(id, |r| {
                r.name = input.name;
                r.ingredients = input.ingredients;
                r.preparation = input.preparation;
            })
            .await
            .ok_or(CookbookError::RecipeNotFound)?;
        tracing::info!(recipe = %id, grant = ?grant, "recipe updated");
        Ok(updated)
    }

    /// Deletes a recipe and its image file.
    ///
    /// # Errors
    ///
    /// Returns [`CookbookError::RecipeNotFound`] or
    /// [`CookbookError::Forbidden`].
    pub async fn delete_recipe(&self, id: &DocId, caller: &AuthUser) -> Result<Recipe, CookbookError> {
        let (_, grant) = self.editable_recipe(id, caller).await?;
        let removed = self
            .recipes
            .delete(id)
            .await
            .ok_or(CookbookError::RecipeNotFound)?;
        if removed.image.is_some() {
            let path = self.image_path(id);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(error = %e, path = %path.display(), "could not remove recipe image");
            }
        }
        tracing::info!(recipe = %id, grant = ?grant, "recipe deleted");
        Ok(removed)
    }

    /// Writes the image to `<uploads>/<id>.jpeg` and records its URL.
    ///
    /// # Errors
    ///
    /// Returns [`CookbookError::RecipeNotFound`],
    /// [`CookbookError::Forbidden`], or [`CookbookError::Internal`] if the
    /// file cannot be written.
    pub async fn attach_image(
        &self,
        id: &DocId,
        caller: &AuthUser,
        image: &[u8],
        host: &str,
    ) -> Result<Recipe, CookbookError> {
        self.editable_recipe(id, caller).await?;

        tokio::fs::create_dir_all(&self.uploads_dir)
            .await
            .map_err(CookbookError::internal)?;
        let path = self.image_path(id);
        tokio::fs::write(&path, image)
            .await
            .map_err(CookbookError::internal)?;

        let url = image_url(host, id);
        tracing::info!(recipe = %id, bytes = image.len(), path = %path.display(), "recipe image stored");
        self.recipes
            .update(id, |r| r.image = Some(url))
            .await
            .ok_or(CookbookError::RecipeNotFound)
    }

    fn image_path(&self, id: &DocId) -> std::path::PathBuf {
        self.uploads_dir.join(format!("{id}.jpeg"))
    }
}

/// Returns the bytes of the `image` field, skipping any other field.
async fn read_image(multipart: &mut Multipart) -> Result<Vec<u8>, CookbookError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            return Ok(field.bytes().await?.to_vec());
        }
    }
    Err(CookbookError::InvalidEntries)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn create(
    State(state): State<Arc<CookbookState>>,
    caller: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeBody>), CookbookError> {
    let Json(body) = payload?;
    let input = validate_recipe(&body)?;
    let recipe = state.create_recipe(input, caller.id).await;
    Ok((StatusCode::CREATED, Json(RecipeBody { recipe })))
}

pub(super) async fn list(State(state): State<Arc<CookbookState>>) -> Json<Vec<Recipe>> {
    Json(state.recipes.find_all().await)
}

pub(super) async fn get(
    State(state): State<Arc<CookbookState>>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, CookbookError> {
    let id = parse_recipe_id(&id)?;
    Ok(Json(state.recipe(&id).await?))
}

pub(super) async fn update(
    State(state): State<Arc<CookbookState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Recipe>, CookbookError> {
    let id = parse_recipe_id(&id)?;
    state.editable_recipe(&id, &caller).await?;
    let Json(body) = payload?;
    let input = validate_recipe(&body)?;
    Ok(Json(state.update_recipe(&id, &caller, input).await?))
}

pub(super) async fn remove(
    State(state): State<Arc<CookbookState>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, CookbookError> {
    let id = parse_recipe_id(&id)?;
    state.delete_recipe(&id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn add_image(
    State(state): State<Arc<CookbookState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Recipe>, CookbookError> {
    let id = parse_recipe_id(&id)?;
    state.editable_recipe(&id, &caller).await?;
    let image = read_image(&mut multipart).await?;
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    Ok(Json(state.attach_image(&id, &caller, &image, host).await?))
}
