//! Shared analysis state.

use std::sync::Arc;

use afc_core::link::{FsLink, RasZone};
use afc_prop::PointToPointModel;
use afc_terrain::TerrainResolver;

use crate::config::AfcConfig;

/// Everything one analysis needs, owned in one place and shared read-only
/// across worker threads.
pub struct AnalysisContext {
    pub config: AfcConfig,
    pub terrain: Arc<TerrainResolver>,
    pub itm: Arc<dyn PointToPointModel>,
    pub links: Vec<FsLink>,
    pub ras_zones: Vec<RasZone>,
}

impl AnalysisContext {
    pub fn new(
        config: AfcConfig,
        terrain: Arc<TerrainResolver>,
        itm: Arc<dyn PointToPointModel>,
        links: Vec<FsLink>,
        ras_zones: Vec<RasZone>,
    ) -> Self {
        Self {
            config,
            terrain,
            itm,
            links,
            ras_zones,
        }
    }
}
