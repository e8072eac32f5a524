pub const FACES: [u8; 6] = [1, 2, 3, 4, 5, 6];

pub mod conf_def {
    pub const CONFIG: &str = "config.json";
    pub const NUM_GAMES: &str = "1000";
    pub const BANK_AT: &str = "350";
    pub const MAX_TURNS: &str = "10000";
}
