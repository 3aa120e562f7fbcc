mod broadcast;

pub use broadcast::{ZeroBroadcastReceiver, ZeroBroadcastSender};
