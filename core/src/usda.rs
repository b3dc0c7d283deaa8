//! Response shapes for the USDA FoodData Central search endpoint and the
//! mapping onto [`Food`].

use serde::Deserialize;

use crate::models::Food;

pub const SEARCH_URL: &str = "https://api.nal.usda.gov/fdc/v1/foods/search";
pub const PAGE_SIZE: u32 = 25;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSearchResponse {
    #[serde(default)]
    pub total_hits: i64,
    #[serde(default)]
    pub current_page: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub foods: Vec<FoodDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDto {
    pub fdc_id: i64,
    pub description: String,
    pub data_type: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrientDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrientDto {
    #[serde(default)]
    pub nutrient_id: i64,
    #[serde(default)]
    pub nutrient_name: String,
    #[serde(default)]
    pub unit_name: String,
    #[serde(default)]
    pub value: f64,
}

/// First nutrient whose name contains any of `needles`, ignoring case.
///
/// Matching on display names is fragile: USDA can rename or add nutrients
/// (e.g. "Energy (Atwater General Factors)") and the first hit wins.
fn nutrient_value(nutrients: &[FoodNutrientDto], needles: &[&str]) -> f64 {
    nutrients
        .iter()
        .find(|n| {
            let name = n.nutrient_name.to_lowercase();
            needles.iter().any(|needle| name.contains(needle))
        })
        .map_or(0.0, |n| n.value)
}

#[must_use]
pub fn food_from_dto(dto: FoodDto) -> Food {
    let nutrients = &dto.food_nutrients;
    Food {
        fdc_id: dto.fdc_id,
        calories_per_100g: nutrient_value(nutrients, &["energy"]),
        protein_per_100g: nutrient_value(nutrients, &["protein"]),
        fat_per_100g: nutrient_value(nutrients, &["total lipid", "fat"]),
        carbs_per_100g: nutrient_value(nutrients, &["carbohydrate"]),
        name: dto.description,
        is_custom: false,
    }
}

#[must_use]
pub fn foods_from_response(response: FoodSearchResponse) -> Vec<Food> {
    response.foods.into_iter().map(food_from_dto).collect()
}
