use cucumber::given;
use store_engine::{
    db_types::{Money, NewCustomer, NewProduct},
    traits::{CustomerManagement, InventoryManagement},
};

use crate::cucumber::{store_world::StoreSystem, StoreWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut StoreWorld) {
    let system = StoreSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a customer named {word}")]
async fn a_customer(world: &mut StoreWorld, name: String) {
    let sys = world.sys_mut();
    let email = format!("{}@example.com", name.to_lowercase());
    let customer = NewCustomer::new(name.clone(), email).with_phone("9876543210");
    let customer = sys.db.register_customer(customer).await.expect("Error registering customer");
    sys.customers.insert(name, customer.id);
}

#[given(expr = "a product {string} priced at {word} with {int} in stock")]
async fn a_product(world: &mut StoreWorld, name: String, price: String, stock: i64) {
    let sys = world.sys_mut();
    let price = price.parse::<Money>().expect("Not a valid price");
    let product = sys.db.insert_product(NewProduct::new(&name, price, stock)).await.expect("Error inserting product");
    sys.products.insert(name, product.id);
}
