pub mod audio;
pub mod device;
pub mod player;

pub use player::AudioPlayer;
