#![allow(dead_code)]

pub mod mock_gateway;
pub mod prepare_env;

use settlement_engine::{
    cart_objects::CartLine,
    db_types::{CustomerDetails, Naira, NewProduct, NewSeller, Product, Seller},
    events::EventProducers,
    CatalogApi,
    MarketplaceDatabase,
    PaymentFlowApi,
    PricingPolicy,
    SqliteDatabase,
};

use self::{
    mock_gateway::MockGateway,
    prepare_env::{drop_database, prepare_test_env, random_db_path},
};

/// A throwaway marketplace: a fresh database, a mock gateway and the APIs wired to them.
pub struct Marketplace {
    pub url: String,
    pub db: SqliteDatabase,
    pub gateway: MockGateway,
    pub flow: PaymentFlowApi<SqliteDatabase, MockGateway>,
    pub catalog: CatalogApi<SqliteDatabase>,
}

impl Marketplace {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 10).await.expect("Error creating connection to database");
        let gateway = MockGateway::default();
        let flow = PaymentFlowApi::new(db.clone(), gateway.clone(), producers)
            .with_callback_url(Some("https://shop.example.com/payment/callback".into()));
        let catalog = CatalogApi::new(db.clone(), PricingPolicy::default());
        Self { url, db, gateway, flow, catalog }
    }

    pub async fn seller(&self, name: &str) -> Seller {
        let seller = NewSeller::new(name.to_string(), format!("{}@example.com", name.to_lowercase()))
            .with_bank_details("0123456789", "058", name);
        self.catalog.add_seller(seller).await.expect("Error adding seller")
    }

    pub async fn seller_without_bank_details(&self, name: &str) -> Seller {
        let seller = NewSeller::new(name.to_string(), format!("{}@example.com", name.to_lowercase()));
        self.catalog.add_seller(seller).await.expect("Error adding seller")
    }

    pub async fn product(&self, seller: &Seller, name: &str, wholesale: i64, stock: i64) -> Product {
        let product = NewProduct::new(seller.id, name, Naira::from(wholesale), stock);
        self.catalog.add_product(product).await.expect("Error adding product")
    }

    pub async fn stock(&self, product_id: i64) -> i64 {
        self.catalog.product(product_id).await.expect("Error fetching product").stock
    }

    /// Makes every `event` (e.g. `INSERT ON order_items`) fail inside the database until [`Self::heal`] is called.
    pub async fn break_writes(&self, name: &str, event: &str) {
        let sql = format!("CREATE TRIGGER {name} BEFORE {event} BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;");
        sqlx::query(&sql).execute(self.db.pool()).await.expect("Error creating trigger");
    }

    pub async fn heal(&self, name: &str) {
        sqlx::query(&format!("DROP TRIGGER {name}")).execute(self.db.pool()).await.expect("Error dropping trigger");
    }

    pub async fn row_count(&self, table: &str) -> i64 {
        let counts: Vec<i64> = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_all(self.db.pool())
            .await
            .expect("Error counting rows");
        counts[0]
    }

    pub async fn tear_down(mut self) {
        if let Err(e) = self.db.close().await {
            log::error!("🚀️ Failed to close database: {e}");
        }
        drop_database(&self.url).await;
    }
}

/// A cart line that quotes the product's current price honestly.
pub fn cart_line(product: &Product, quantity: i64) -> CartLine {
    CartLine::new(product.id, product.seller_id, quantity, product.customer_price.as_f64())
}

pub fn customer() -> CustomerDetails {
    CustomerDetails {
        email: "ada@example.com".to_string(),
        name: "Ada Obi".to_string(),
        phone: Some("+2348012345678".to_string()),
        shipping_address: "12 Admiralty Way, Lekki, Lagos".to_string(),
    }
}
