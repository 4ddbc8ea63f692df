pub mod playback_state;
pub mod time_update_clock;
pub mod video_player;
pub mod video_source;
