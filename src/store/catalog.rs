use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: String,
}

/// Fields submitted through the add-product form. Missing fields become empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
}

/// A contact message. Append-only, no identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// CatalogStore trait
// ---------------------------------------------------------------------------

/// Product and message storage backing the page handlers.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Append a product. Its id is the product count before insertion plus one.
    async fn add_product(&self, product: NewProduct) -> Product;

    async fn find_product(&self, id: u64) -> Option<Product>;

    async fn list_products(&self) -> Vec<Product>;

    async fn add_message(&self, message: Message);

    async fn list_messages(&self) -> Vec<Message>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Process-memory catalog. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<Vec<Product>>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-loaded with the two demo products.
    pub fn seeded() -> Self {
        let products = vec![
            Product {
                id: 1,
                name: "Product A".into(),
                description: "Desc A".into(),
                price: "$10".into(),
            },
            Product {
                id: 2,
                name: "Product B".into(),
                description: "Desc B".into(),
                price: "$20".into(),
            },
        ];
        Self {
            products: RwLock::new(products),
            messages: RwLock::default(),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn add_product(&self, product: NewProduct) -> Product {
        let mut products = self.products.write().await;
        // count + 1, not max + 1: only unique while products are never removed
        let product = Product {
            id: products.len() as u64 + 1,
            name: product.name,
            description: product.description,
            price: product.price,
        };
        products.push(product.clone());
        product
    }

    async fn find_product(&self, id: u64) -> Option<Product> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    async fn list_products(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    async fn add_message(&self, message: Message) {
        self.messages.write().await.push(message);
    }

    async fn list_messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }
}
