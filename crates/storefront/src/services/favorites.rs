//! Favorites persistence.
//!
//! Guests keep favorites in the session; customers in `"user".favorites`.
//! On login the two lists are merged, stored, and only then is the session
//! copy dropped, so a failed write never loses the guest's list.

use sqlx::PgPool;
use tower_sessions::Session;
use tracing::{info, instrument};

use eyeric_core::catalog::Product;
use eyeric_core::favorites::Favorites;
use eyeric_core::{ProductId, UserId};

use super::PersistenceError;
use crate::db::UserRepository;
use crate::models::session::keys;

/// Favorites access for one request.
pub struct FavoritesService<'a> {
    users: UserRepository<'a>,
    session: &'a Session,
}

impl<'a> FavoritesService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session) -> Self {
        Self {
            users: UserRepository::new(pool),
            session,
        }
    }

    /// # Errors
    ///
    /// Returns `PersistenceError` if the session or database read fails.
    pub async fn load(&self, user: Option<UserId>) -> Result<Favorites, PersistenceError> {
        match user {
            Some(id) => Ok(self.users.load_favorites(id).await?),
            None => Ok(self.session_favorites().await?),
        }
    }

    /// Add or remove `product`. Returns whether it is a favorite afterwards.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the read or write fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn toggle(
        &self,
        user: Option<UserId>,
        product: Product,
    ) -> Result<(Favorites, bool), PersistenceError> {
        let mut favorites = self.load(user).await?;
        let now_favorite = favorites.toggle(product);
        self.save(user, &favorites).await?;
        Ok((favorites, now_favorite))
    }

    /// Remove a product. Removing a product that is not a favorite is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the read or write fails.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user: Option<UserId>,
        product_id: ProductId,
    ) -> Result<Favorites, PersistenceError> {
        let mut favorites = self.load(user).await?;
        if favorites.remove(product_id) {
            self.save(user, &favorites).await?;
        }
        Ok(favorites)
    }

    /// Merge the guest favorites into the customer's after login.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the merged list could not be stored; the
    /// guest list is then left in the session.
    #[instrument(skip(self))]
    pub async fn merge_on_login(&self, user: UserId) -> Result<(), PersistenceError> {
        let local = self.session_favorites().await?;
        if local.is_empty() {
            return Ok(());
        }

        let remote = self.users.load_favorites(user).await?;
        let merged = Favorites::merge(local, remote);
        self.users.save_favorites(user, &merged).await?;
        self.session.remove::<Favorites>(keys::FAVORITES).await?;

        info!(user_id = %user, count = merged.len(), "Merged guest favorites");
        Ok(())
    }

    async fn save(&self, user: Option<UserId>, favorites: &Favorites) -> Result<(), PersistenceError> {
        match user {
            Some(id) => self.users.save_favorites(id, favorites).await?,
            None => self.session.insert(keys::FAVORITES, favorites).await?,
        }
        Ok(())
    }

    async fn session_favorites(&self) -> Result<Favorites, tower_sessions::session::Error> {
        Ok(self
            .session
            .get::<Favorites>(keys::FAVORITES)
            .await?
            .unwrap_or_default())
    }
}
