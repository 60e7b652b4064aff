//! Cart persistence.
//!
//! Guests keep their cart in the session. Logged-in customers keep it in
//! `"user".cart_items`, written whole after every change. The row carries a
//! `cart_version`, so a read-modify-write that lost a race with another tab
//! is retried once against the fresh cart before giving up.

use sqlx::PgPool;
use tower_sessions::Session;
use tracing::{instrument, warn};

use eyeric_core::UserId;
use eyeric_core::cart::Cart;

use super::PersistenceError;
use crate::db::{RepositoryError, UserRepository};
use crate::models::session::keys;

/// Attempts at a versioned cart write before reporting a conflict.
const SAVE_ATTEMPTS: usize = 2;

/// Cart access for one request.
pub struct CartService<'a> {
    users: UserRepository<'a>,
    session: &'a Session,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session) -> Self {
        Self {
            users: UserRepository::new(pool),
            session,
        }
    }

    /// The current cart of a customer, or of the guest session when `user`
    /// is `None`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the session or database read fails.
    #[instrument(skip(self))]
    pub async fn load(&self, user: Option<UserId>) -> Result<Cart, PersistenceError> {
        match user {
            Some(id) => Ok(self.users.load_cart(id).await?.cart),
            None => Ok(self.session_cart().await?),
        }
    }

    /// Apply `change` to the cart and persist the result.
    ///
    /// `change` may run twice for a customer if the first write loses a race,
    /// so it must only depend on the cart it is given.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Repository(RepositoryError::Conflict)` if the
    /// cart kept changing underneath, or any read/write failure.
    #[instrument(skip(self, change))]
    pub async fn update<T>(
        &self,
        user: Option<UserId>,
        change: impl Fn(&mut Cart) -> T,
    ) -> Result<(Cart, T), PersistenceError> {
        let Some(id) = user else {
            let mut cart = self.session_cart().await?;
            let outcome = change(&mut cart);
            self.session.insert(keys::CART, &cart).await?;
            return Ok((cart, outcome));
        };

        let mut attempt = 1;
        loop {
            let stored = self.users.load_cart(id).await?;
            let mut cart = stored.cart;
            let outcome = change(&mut cart);

            match self.users.save_cart(id, &cart, stored.version).await {
                Ok(_) => return Ok((cart, outcome)),
                Err(RepositoryError::Conflict(reason)) if attempt < SAVE_ATTEMPTS => {
                    warn!(user_id = %id, %reason, "Cart write lost a race, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fold the guest cart into the customer's stored cart after login.
    ///
    /// The session copy is removed only once the merged cart is saved.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the merge could not be saved; the guest
    /// cart is then left in the session.
    #[instrument(skip(self))]
    pub async fn merge_on_login(&self, user: UserId) -> Result<(), PersistenceError> {
        let guest = self.session_cart().await?;
        if guest.is_empty() {
            return Ok(());
        }

        self.update(Some(user), |cart| cart.merge(guest.clone()))
            .await?;
        self.session.remove::<Cart>(keys::CART).await?;
        Ok(())
    }

    async fn session_cart(&self) -> Result<Cart, tower_sessions::session::Error> {
        Ok(self
            .session
            .get::<Cart>(keys::CART)
            .await?
            .unwrap_or_default())
    }
}
