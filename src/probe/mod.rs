pub mod ping;

pub use ping::{PingFlavor, PingProber};
