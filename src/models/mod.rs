//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos tal como los expone la API
//! REST del backend del marketplace.

pub mod bid;
pub mod load_request;
pub mod session;
pub mod status;
pub mod truck;

pub use bid::{Bid, LoadSnapshot, NewBid, TruckSnapshot};
pub use load_request::{LoadRequest, Location, NewLoadRequest};
pub use session::{AccountType, Session};
pub use status::BidStatus;
pub use truck::{CurrentLoad, DriverInfo, NewTruck, OwnerContact, Truck, TruckStatus, TruckStatusUpdate};
