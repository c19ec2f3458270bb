//! Reorder settings from the backend config file

use sibling_order::ReorderConfig;
use super::{call, CommandError, NoArgs};

pub async fn get_reorder_config() -> Result<ReorderConfig, CommandError> {
    call("get_reorder_config", &NoArgs {}).await
}
