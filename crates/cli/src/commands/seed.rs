//! Seed the database with demo data.
//!
//! Creates one owner with two restaurants and a small menu each, plus one
//! customer. Tokens for both users are printed so the API can be tried
//! straight away.

use chrono::Utc;
use tracing::info;

use food_delivery_api::db::PgStore;
use food_delivery_api::models::{NewProduct, NewRestaurant, NewUser, User};
use food_delivery_core::{Money, Role};

use super::{CommandError, connect, generate_token};

struct DemoRestaurant {
    name: &'static str,
    description: &'static str,
    address: &'static str,
    shipping_cents: i64,
    menu: &'static [(&'static str, i64)],
}

const RESTAURANTS: &[DemoRestaurant] = &[
    DemoRestaurant {
        name: "Casa Felix",
        description: "Home cooking and tapas",
        address: "Calle Larios 12, Malaga",
        shipping_cents: 250,
        menu: &[
            ("Croquetas", 300),
            ("Tortilla de patatas", 650),
            ("Ensaladilla rusa", 450),
        ],
    },
    DemoRestaurant {
        name: "Pizzeria Napoli",
        description: "Wood-fired pizza",
        address: "Avenida de Andalucia 3, Malaga",
        shipping_cents: 150,
        menu: &[("Margherita", 850), ("Diavola", 1050), ("Tiramisu", 500)],
    },
];

/// Insert demo users, restaurants and products.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the demo users already
/// exist.
pub async fn run() -> Result<(), CommandError> {
    let (config, store) = connect().await?;
    let expires = Utc::now() + config.token_ttl();

    let owner = demo_user(&store, "owner1@example.com", "Olga", Role::Owner, expires).await?;
    demo_user(&store, "customer1@example.com", "Carl", Role::Customer, expires).await?;

    for demo in RESTAURANTS {
        let restaurant = store
            .create_restaurant(&NewRestaurant {
                owner_id: owner.id,
                name: demo.name.to_owned(),
                description: Some(demo.description.to_owned()),
                address: demo.address.to_owned(),
                shipping_costs: Money::from_cents(demo.shipping_cents),
            })
            .await?;

        for &(name, cents) in demo.menu {
            store
                .create_product(&NewProduct {
                    restaurant_id: restaurant.id,
                    name: name.to_owned(),
                    description: None,
                    price: Money::from_cents(cents),
                })
                .await?;
        }
        info!(restaurant_id = %restaurant.id, name = demo.name, products = demo.menu.len(), "Seeded restaurant");
    }

    info!("Seed complete!");
    Ok(())
}

async fn demo_user(
    store: &PgStore,
    email: &str,
    first_name: &str,
    role: Role,
    expires: chrono::DateTime<Utc>,
) -> Result<User, CommandError> {
    let token = generate_token();
    let user = store
        .create_user(&NewUser {
            email: email.to_owned(),
            first_name: first_name.to_owned(),
            role,
            token: token.clone(),
            token_expiration: Some(expires),
        })
        .await?;

    info!(user_id = %user.id, email, %role, "Seeded user");

    #[allow(clippy::print_stdout)]
    {
        println!("{role}\t{email}\t{token}");
    }

    Ok(user)
}
