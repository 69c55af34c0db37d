use rust_decimal::Decimal;

use crate::domain::access::Role;
use crate::domain::catalog::Product;
use crate::domain::user::User;
use crate::store::{ProductCatalog, UserDirectory};

/// Demo accounts and menu for a fresh in-memory deployment.
pub async fn seed_demo_data(users: &dyn UserDirectory, catalog: &dyn ProductCatalog) -> anyhow::Result<()> {
    let accounts = [
        User::new("Admin", "admin@foodorders.local", Role::Admin),
        User::new("Rico Santos", "rico@foodorders.local", Role::Delivery),
        User::new("Lea Cruz", "lea@foodorders.local", Role::Delivery),
        User::new("Ana Reyes", "ana@foodorders.local", Role::Customer),
    ];
    for user in accounts {
        tracing::info!(user_id = %user.id, role = %user.role, name = %user.name, "Seeded user");
        users.upsert(user).await?;
    }

    let menu = [
        Product::new("Chicken Adobo", "mains", Decimal::new(1850, 2), 40)
            .with_description("Braised in vinegar, soy and garlic"),
        Product::new("Pork Sinigang", "soups", Decimal::new(2200, 2), 25)
            .with_description("Tamarind broth with vegetables"),
        Product::new("Garlic Rice", "sides", Decimal::new(350, 2), 100),
        Product::new("Halo-Halo", "desserts", Decimal::new(900, 2), 30)
            .with_description("Shaved ice with sweet beans and leche flan"),
        Product::new("Calamansi Juice", "drinks", Decimal::new(400, 2), 60),
    ];
    for product in menu {
        tracing::info!(product_id = %product.id, name = %product.name, stock = product.stock, "Seeded product");
        catalog.upsert(product).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryProductCatalog, InMemoryUserDirectory};

    #[tokio::test]
    async fn test_seed_creates_admin_and_menu() {
        let users = InMemoryUserDirectory::new();
        let catalog = InMemoryProductCatalog::new();

        seed_demo_data(&users, &catalog).await.unwrap();

        assert_eq!(users.list_admins().await.unwrap().len(), 1);
        assert_eq!(catalog.list_active().await.unwrap().len(), 5);
    }
}
