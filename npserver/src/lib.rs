//! # npserver - Serveur HTTP local basé sur Axum
//!
//! Cette crate fournit une petite abstraction au-dessus d'Axum pour le serveur
//! local du pont now-playing : il n'expose que quelques routes (login OAuth,
//! callback, réglage du niveau de log) mais doit démarrer avant que les
//! credentials n'existent et tourner pendant toute la vie du processus.
//!
//! ## Architecture
//!
//! - [`server`] : le serveur, ses routes et son cycle de vie
//! - [`logs`] : initialisation de `tracing` avec un filtre rechargeable
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use npserver::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = Server::new_configured();
//!     server.init_logging().await;
//!
//!     server.add_route("/info", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, init_logging};
pub use server::{Server, ServerInfo};
