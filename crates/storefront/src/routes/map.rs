//! Map picker configuration.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// Settings the address map picker starts from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub public_key: Option<String>,
}

/// GET /api/map/config
pub async fn config(State(state): State<AppState>) -> Json<MapSettings> {
    let map = &state.config().map;
    Json(MapSettings {
        latitude: map.default_lat,
        longitude: map.default_lng,
        zoom: map.default_zoom,
        public_key: map.public_key.clone(),
    })
}
