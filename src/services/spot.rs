//! Spot service
//!
//! Listing, creation with field validation, detail lookup, and owner-only
//! image uploads.

use crate::db::repositories::SpotRepository;
use crate::models::{CreateSpotInput, Spot, SpotDetails, SpotImage, SpotSummary};
use crate::policy::RequestContext;
use crate::services::error::{FieldErrors, ServiceError};
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Longest accepted spot name, in characters
pub const MAX_SPOT_NAME_LEN: usize = 49;

/// Spot creation request body. Every field is optional so missing fields
/// surface as validation messages instead of a parse failure. Coordinates
/// and price may arrive as JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotInput {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: Option<Value>,
    pub lng: Option<Value>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Value>,
}

impl SpotInput {
    pub fn validate(self) -> Result<CreateSpotInput, ServiceError> {
        let mut errors = FieldErrors::new();

        let address = required(self.address, "address", "Street address is required", &mut errors);
        let city = required(self.city, "city", "City is required", &mut errors);
        let state = required(self.state, "state", "State is required", &mut errors);
        let country = required(self.country, "country", "Country is required", &mut errors);

        let lat = numeric(self.lat).filter(|v| (-90.0..=90.0).contains(v));
        if lat.is_none() {
            errors.insert("lat".into(), "Latitude is not valid".into());
        }
        let lng = numeric(self.lng).filter(|v| (-180.0..=180.0).contains(v));
        if lng.is_none() {
            errors.insert("lng".into(), "Longitude is not valid".into());
        }

        let name = required(self.name, "name", "Name is required", &mut errors);
        if name.chars().count() > MAX_SPOT_NAME_LEN {
            errors.insert("name".into(), "Name must be less than 50 characters".into());
        }

        let description = required(
            self.description,
            "description",
            "Description is required",
            &mut errors,
        );

        let price = numeric(self.price).filter(|p| *p > 0.0);
        if price.is_none() {
            errors.insert("price".into(), "Price per day is required".into());
        }

        match (lat, lng, price) {
            (Some(lat), Some(lng), Some(price)) if errors.is_empty() => Ok(CreateSpotInput {
                address,
                city,
                state,
                country,
                lat,
                lng,
                name,
                description,
                price,
            }),
            _ => Err(ServiceError::Validation(errors)),
        }
    }
}

fn required(value: Option<String>, field: &str, message: &str, errors: &mut FieldErrors) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            errors.insert(field.to_string(), message.to_string());
            String::new()
        }
    }
}

/// A finite number given either as a JSON number or a numeric string
fn numeric(value: Option<Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Spot image request body
#[derive(Debug, Clone, Deserialize)]
pub struct SpotImageInput {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub preview: bool,
}

/// Spot service
pub struct SpotService {
    repo: Arc<dyn SpotRepository>,
}

impl SpotService {
    pub fn new(repo: Arc<dyn SpotRepository>) -> Self {
        Self { repo }
    }

    /// Every spot with its images and average rating
    pub async fn list(&self) -> Result<Vec<SpotSummary>, ServiceError> {
        Ok(self.repo.list_summaries().await.context("Failed to list spots")?)
    }

    /// Create a spot owned by the requester
    pub async fn create(&self, ctx: &RequestContext, input: SpotInput) -> Result<Spot, ServiceError> {
        let input = input.validate()?;
        let spot = self
            .repo
            .create(&Spot::new(ctx.user_id, input))
            .await
            .context("Failed to create spot")?;

        tracing::info!(spot_id = spot.id, owner_id = ctx.user_id, "Spot created");
        Ok(spot)
    }

    pub async fn details(&self, spot_id: i64) -> Result<SpotDetails, ServiceError> {
        self.repo
            .get_details(spot_id)
            .await
            .context("Failed to load spot")?
            .ok_or_else(spot_not_found)
    }

    /// Attach an image to a spot. Only the owner may do this.
    pub async fn add_image(
        &self,
        ctx: &RequestContext,
        spot_id: i64,
        input: SpotImageInput,
    ) -> Result<SpotImage, ServiceError> {
        if input.url.trim().is_empty() {
            return Err(ServiceError::invalid("url", "Image url is required"));
        }

        let spot = self
            .repo
            .get_by_id(spot_id)
            .await
            .context("Failed to load spot")?
            .ok_or_else(spot_not_found)?;
        if !spot.is_owned_by(ctx.user_id) {
            return Err(ServiceError::Forbidden("Forbidden".to_string()));
        }

        let image = self
            .repo
            .add_image(spot.id, &input.url, input.preview)
            .await
            .context("Failed to add spot image")?;
        Ok(image)
    }
}

pub(crate) fn spot_not_found() -> ServiceError {
    ServiceError::NotFound("Spot couldn't be found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{fixtures, SqlxSpotRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use serde_json::json;

    async fn setup_test_service() -> (DynDatabasePool, SpotService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = SpotService::new(SqlxSpotRepository::boxed(pool.clone()));
        (pool, service)
    }

    fn valid_input() -> SpotInput {
        SpotInput {
            address: Some("123 Disney Lane".into()),
            city: Some("San Francisco".into()),
            state: Some("California".into()),
            country: Some("United States of America".into()),
            lat: Some(json!(37.7645358)),
            lng: Some(json!(-122.4730327)),
            name: Some("App Academy".into()),
            description: Some("Place where web developers are created".into()),
            price: Some(json!(123)),
        }
    }

    #[test]
    fn test_empty_input_reports_every_field() {
        let err = SpotInput::default().validate().unwrap_err();
        let errors = err.field_errors().unwrap();

        assert_eq!(errors.len(), 9);
        assert_eq!(errors["address"], "Street address is required");
        assert_eq!(errors["lat"], "Latitude is not valid");
        assert_eq!(errors["price"], "Price per day is required");
    }

    #[test]
    fn test_name_length_and_coordinates() {
        let mut input = valid_input();
        input.name = Some("x".repeat(50));
        input.lat = Some(json!(91.0));
        input.lng = Some(json!(-180.0));

        let errors = input.validate().unwrap_err().field_errors().unwrap();

        assert_eq!(errors["name"], "Name must be less than 50 characters");
        assert_eq!(errors["lat"], "Latitude is not valid");
        assert!(!errors.contains_key("lng"));
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let mut input = valid_input();
        input.lat = Some(json!("37.76"));
        input.lng = Some(json!(" -122.47 "));
        input.price = Some(json!("99.5"));

        let spot = input.validate().unwrap();

        assert_eq!(spot.lat, 37.76);
        assert_eq!(spot.lng, -122.47);
        assert_eq!(spot.price, 99.5);
    }

    #[test]
    fn test_non_numeric_coordinates_rejected() {
        let mut input = valid_input();
        input.lat = Some(json!("north"));
        input.lng = Some(json!(true));
        input.price = Some(json!("NaN"));

        let errors = input.validate().unwrap_err().field_errors().unwrap();

        assert_eq!(errors["lat"], "Latitude is not valid");
        assert_eq!(errors["lng"], "Longitude is not valid");
        assert_eq!(errors["price"], "Price per day is required");
    }

    #[test]
    fn test_valid_input_passes() {
        let mut input = valid_input();
        input.name = Some("x".repeat(49));

        assert!(input.validate().is_ok());
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (pool, service) = setup_test_service().await;
        let owner = fixtures::seed_user(&pool, "owner").await;

        let spot = service
            .create(&RequestContext::new(owner), valid_input())
            .await
            .unwrap();
        let listed = service.list().await.unwrap();

        assert_eq!(spot.owner_id, owner);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].spot.name, "App Academy");
    }

    #[tokio::test]
    async fn test_only_owner_adds_images() {
        let (pool, service) = setup_test_service().await;
        let owner = fixtures::seed_user(&pool, "owner").await;
        let other = fixtures::seed_user(&pool, "other").await;
        let spot = fixtures::seed_spot(&pool, owner, "Cabin").await;
        let image = || SpotImageInput {
            url: "front.jpg".into(),
            preview: true,
        };

        let denied = service.add_image(&RequestContext::new(other), spot, image()).await;
        let missing = service.add_image(&RequestContext::new(owner), 999, image()).await;
        let added = service
            .add_image(&RequestContext::new(owner), spot, image())
            .await
            .unwrap();

        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
        assert!(added.preview);
        let details = service.details(spot).await.unwrap();
        assert_eq!(details.images.len(), 1);
    }
}
