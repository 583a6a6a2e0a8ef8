pub mod corporation;
pub mod flag;
pub mod game_box;
pub mod game_level;
pub mod hint;
pub mod ip_address;
pub mod market_item;
pub mod team;

pub use corporation::{Corporation, NewCorporation};
pub use flag::{Flag, FlagKind, NewFlag};
pub use game_box::{GameBox, NewGameBox};
pub use game_level::{GameLevel, NewGameLevel};
pub use hint::{Hint, NewHint};
pub use ip_address::{IpAddress, NewIpAddress};
pub use market_item::{MarketItem, NewMarketItem};
pub use team::{NewTeam, Team};
