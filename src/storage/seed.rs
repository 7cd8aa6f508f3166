//! Demo data: two accounts, five categories and a dozen products.

use std::collections::BTreeMap;

use tracing::info;

use crate::domain::{DiscountRate, Money, Role};
use crate::error::{OrderError, Result};
use crate::interfaces::{CatalogWriter, NewCategory, NewProduct, NewUser};

struct DemoUser {
    name: &'static str,
    email: &'static str,
    role: Role,
    phone: &'static str,
    address: &'static str,
}

struct DemoProduct {
    category: &'static str,
    name: &'static str,
    description: &'static str,
    price: i64,
    stock: i64,
    unit: &'static str,
    discount_percent: u32,
}

const DEMO_USERS: [DemoUser; 2] = [
    DemoUser {
        name: "Admin Fresh Mart",
        email: "admin@freshmart.com",
        role: Role::Admin,
        phone: "081234567890",
        address: "Jl. Admin No. 1, Jakarta",
    },
    DemoUser {
        name: "Customer Test",
        email: "customer@test.com",
        role: Role::Customer,
        phone: "081234567891",
        address: "Jl. Customer No. 2, Jakarta",
    },
];

const DEMO_CATEGORIES: [(&str, &str); 5] = [
    ("Sayuran", "Berbagai macam sayuran segar"),
    ("Buah-buahan", "Buah segar pilihan"),
    ("Daging", "Daging segar berkualitas"),
    ("Seafood", "Ikan dan hasil laut segar"),
    ("Susu & Telur", "Produk susu dan telur"),
];

const fn product(
    category: &'static str,
    name: &'static str,
    description: &'static str,
    price: i64,
    stock: i64,
    unit: &'static str,
    discount_percent: u32,
) -> DemoProduct {
    DemoProduct {
        category,
        name,
        description,
        price,
        stock,
        unit,
        discount_percent,
    }
}

const DEMO_PRODUCTS: [DemoProduct; 12] = [
    product("Sayuran", "Bayam Segar", "Bayam hijau segar untuk sayur", 5000, 50, "kg", 0),
    product("Sayuran", "Kangkung", "Kangkung hijau segar", 4000, 60, "kg", 10),
    product("Sayuran", "Wortel", "Wortel segar untuk masakan", 8000, 40, "kg", 0),
    product("Buah-buahan", "Apel Fuji", "Apel Fuji import segar", 35000, 30, "kg", 5),
    product("Buah-buahan", "Jeruk Mandarin", "Jeruk mandarin manis", 25000, 45, "kg", 0),
    product("Buah-buahan", "Pisang Cavendish", "Pisang cavendish premium", 18000, 50, "kg", 0),
    product("Daging", "Daging Sapi", "Daging sapi segar pilihan", 120000, 25, "kg", 0),
    product("Daging", "Ayam Kampung", "Ayam kampung segar", 45000, 35, "kg", 0),
    product("Seafood", "Ikan Salmon", "Ikan salmon segar import", 150000, 20, "kg", 0),
    product("Seafood", "Udang Windu", "Udang windu segar", 85000, 30, "kg", 10),
    product("Susu & Telur", "Telur Ayam", "Telur ayam kampung", 28000, 100, "kg", 0),
    product("Susu & Telur", "Susu Segar", "Susu sapi segar 1 liter", 15000, 50, "liter", 0),
];

/// Ids assigned to the demo rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoCatalog {
    pub admin_id: i64,
    pub customer_id: i64,
    pub categories: BTreeMap<String, i64>,
    pub products: BTreeMap<String, i64>,
}

impl DemoCatalog {
    /// Id of a demo product by name.
    pub fn product(&self, name: &str) -> Result<i64> {
        self.products
            .get(name)
            .copied()
            .ok_or_else(|| OrderError::InvalidRequest(format!("no demo product named {name}")))
    }
}

/// Insert the demo rows unconditionally.
pub async fn insert_demo_data(store: &dyn CatalogWriter) -> Result<DemoCatalog> {
    let mut catalog = DemoCatalog::default();

    for user in &DEMO_USERS {
        let id = store
            .insert_user(NewUser {
                name: user.name.to_string(),
                email: user.email.to_string(),
                role: user.role,
                phone: Some(user.phone.to_string()),
                address: Some(user.address.to_string()),
                is_active: true,
            })
            .await?;
        match user.role {
            Role::Admin => catalog.admin_id = id,
            Role::Customer => catalog.customer_id = id,
        }
    }

    for (name, description) in DEMO_CATEGORIES {
        let id = store
            .insert_category(NewCategory {
                name: name.to_string(),
                description: Some(description.to_string()),
            })
            .await?;
        catalog.categories.insert(name.to_string(), id);
    }

    for demo in &DEMO_PRODUCTS {
        let category_id = catalog
            .categories
            .get(demo.category)
            .copied()
            .ok_or_else(|| OrderError::Persistence(format!("missing category {}", demo.category)))?;
        let discount = DiscountRate::from_percent(demo.discount_percent).ok_or_else(|| {
            OrderError::Persistence(format!("bad discount for {}", demo.name))
        })?;

        let id = store
            .insert_product(NewProduct {
                category_id,
                name: demo.name.to_string(),
                description: Some(demo.description.to_string()),
                price: Money::from_major(demo.price),
                discount,
                stock: demo.stock,
                unit: demo.unit.to_string(),
                image_url: None,
                is_available: true,
            })
            .await?;
        catalog.products.insert(demo.name.to_string(), id);
    }

    Ok(catalog)
}

/// Seed the demo rows when the catalog is empty.
///
/// Returns `None` if products already exist.
pub async fn seed_demo(store: &dyn CatalogWriter) -> Result<Option<DemoCatalog>> {
    if store.product_count().await? > 0 {
        info!("Catalog already populated, skipping demo seed");
        return Ok(None);
    }

    let catalog = insert_demo_data(store).await?;
    info!(
        users = DEMO_USERS.len(),
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Seeded demo data"
    );
    Ok(Some(catalog))
}
