use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{error, radio, success, types::PkceToken};

pub async fn auth(shared_state: Arc<Mutex<Option<PkceToken>>>) {
    match radio::auth::sign_in(shared_state).await {
        Ok(token) => success!("Signed in (scope: {}).", token.scope),
        Err(e) => error!("Sign-in failed. Err: {}", e),
    }
}
