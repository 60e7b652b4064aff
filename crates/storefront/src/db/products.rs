//! Product repository.
//!
//! The storefront loads the whole table and filters in memory, so there is
//! no pagination here; `list_all` feeds the catalogue cache.

use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use eyeric_core::catalog::{ColorVariant, DisplayOrders, FrameType, Gender, Product};
use eyeric_core::{LensCategoryId, ProductId, SpecialCategoryId};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = r"
    p.id, p.title, p.description, p.original_price, p.discounted_price,
    p.gender_category, p.type_category, p.shape_category, p.style_category,
    p.colors, p.features, p.is_lens_used, p.lens_category_id, p.display_order,
    p.men_sunglasses_display_order, p.men_eyeglasses_display_order,
    p.men_computerglasses_display_order, p.men_powersunglasses_display_order,
    p.women_sunglasses_display_order, p.women_eyeglasses_display_order,
    p.women_computerglasses_display_order, p.women_powersunglasses_display_order,
    p.kids_sunglasses_display_order, p.kids_eyeglasses_display_order,
    p.kids_computerglasses_display_order, p.kids_powersunglasses_display_order
";

/// Raw `products` row.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    description: String,
    original_price: Decimal,
    discounted_price: Option<Decimal>,
    gender_category: Vec<String>,
    type_category: Vec<String>,
    shape_category: Option<String>,
    style_category: Option<String>,
    colors: Json<Vec<ColorVariant>>,
    features: Vec<String>,
    is_lens_used: bool,
    lens_category_id: Option<LensCategoryId>,
    display_order: Option<i32>,
    men_sunglasses_display_order: Option<i32>,
    men_eyeglasses_display_order: Option<i32>,
    men_computerglasses_display_order: Option<i32>,
    men_powersunglasses_display_order: Option<i32>,
    women_sunglasses_display_order: Option<i32>,
    women_eyeglasses_display_order: Option<i32>,
    women_computerglasses_display_order: Option<i32>,
    women_powersunglasses_display_order: Option<i32>,
    kids_sunglasses_display_order: Option<i32>,
    kids_eyeglasses_display_order: Option<i32>,
    kids_computerglasses_display_order: Option<i32>,
    kids_powersunglasses_display_order: Option<i32>,
}

impl ProductRow {
    fn display_orders(&self) -> DisplayOrders {
        let columns = [
            (Gender::Men, self.men_display_orders()),
            (Gender::Women, self.women_display_orders()),
            (Gender::Kids, self.kids_display_orders()),
        ];

        let mut orders = DisplayOrders::default();
        for (gender, per_type) in columns {
            for (frame_type, order) in FrameType::ALL.into_iter().zip(per_type) {
                orders.set(gender, frame_type, order);
            }
        }
        orders
    }

    const fn men_display_orders(&self) -> [Option<i32>; 4] {
        [
            self.men_sunglasses_display_order,
            self.men_eyeglasses_display_order,
            self.men_computerglasses_display_order,
            self.men_powersunglasses_display_order,
        ]
    }

    const fn women_display_orders(&self) -> [Option<i32>; 4] {
        [
            self.women_sunglasses_display_order,
            self.women_eyeglasses_display_order,
            self.women_computerglasses_display_order,
            self.women_powersunglasses_display_order,
        ]
    }

    const fn kids_display_orders(&self) -> [Option<i32>; 4] {
        [
            self.kids_sunglasses_display_order,
            self.kids_eyeglasses_display_order,
            self.kids_computerglasses_display_order,
            self.kids_powersunglasses_display_order,
        ]
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let display_orders = row.display_orders();
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            original_price: row.original_price,
            discounted_price: row.discounted_price,
            gender_category: row.gender_category,
            type_category: row.type_category,
            shape_category: row.shape_category,
            style_category: row.style_category,
            colors: row.colors.0,
            features: row.features,
            is_lens_used: row.is_lens_used,
            lens_category_id: row.lens_category_id,
            display_order: row.display_order,
            display_orders,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products p ORDER BY p.id"))
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Products assigned to a special category, in the category's own order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_by_special_category(
        &self,
        category: SpecialCategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN product_special_categories psc ON psc.product_id = p.id
            WHERE psc.special_category_id = $1
            ORDER BY psc.display_order NULLS LAST, p.id
            "
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Insert a product and return its new id.
    ///
    /// Used by the catalogue import; the id on `product` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn insert(&self, product: &Product) -> Result<ProductId, RepositoryError> {
        let orders = |gender: Gender| FrameType::ALL.map(|t| product.display_orders.get(gender, t));
        let [ms, me, mc, mp] = orders(Gender::Men);
        let [ws, we, wc, wp] = orders(Gender::Women);
        let [ks, ke, kc, kp] = orders(Gender::Kids);

        let (id,): (ProductId,) = sqlx::query_as(
            r"
            INSERT INTO products (
                title, description, original_price, discounted_price,
                gender_category, type_category, shape_category, style_category,
                colors, features, is_lens_used, lens_category_id, display_order,
                men_sunglasses_display_order, men_eyeglasses_display_order,
                men_computerglasses_display_order, men_powersunglasses_display_order,
                women_sunglasses_display_order, women_eyeglasses_display_order,
                women_computerglasses_display_order, women_powersunglasses_display_order,
                kids_sunglasses_display_order, kids_eyeglasses_display_order,
                kids_computerglasses_display_order, kids_powersunglasses_display_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)
            RETURNING id
            ",
        )
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.original_price)
        .bind(product.discounted_price)
        .bind(&product.gender_category)
        .bind(&product.type_category)
        .bind(&product.shape_category)
        .bind(&product.style_category)
        .bind(Json(&product.colors))
        .bind(&product.features)
        .bind(product.is_lens_used)
        .bind(product.lens_category_id)
        .bind(product.display_order)
        .bind(ms)
        .bind(me)
        .bind(mc)
        .bind(mp)
        .bind(ws)
        .bind(we)
        .bind(wc)
        .bind(wp)
        .bind(ks)
        .bind(ke)
        .bind(kc)
        .bind(kp)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}
