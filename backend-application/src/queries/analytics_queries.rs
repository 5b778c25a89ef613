use backend_domain::services::tier_policy;
use backend_domain::{Tier, TieredSnapshot};

use crate::AppState;

/// Tier filtering happens here and nowhere else on the read path.
pub async fn get_analytics(state: &AppState, tier: Tier) -> TieredSnapshot {
    let snapshot = state.snapshot.read().await.clone();
    tier_policy::filter(&snapshot, tier, &state.config.tier_policy_config())
}
