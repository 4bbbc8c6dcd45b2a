use crate::{
    config::AuthSettings,
    db::{DbPool, OrmConn, pool_of},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(orm: OrmConn, auth: AuthSettings) -> Self {
        Self {
            pool: pool_of(&orm),
            orm,
            auth,
        }
    }
}
