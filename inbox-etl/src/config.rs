use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "INPUT_PATH", default = "data/raw/transactions.json")]
    pub input_path: String,

    #[envconfig(from = "TICKETS_PATH", default = "data/processed/tickets.json")]
    pub tickets_path: String,

    #[envconfig(from = "METRICS_PATH", default = "data/processed/metrics.json")]
    pub metrics_path: String,

    #[envconfig(from = "TOP_N", default = "5")]
    pub top_n: usize,
}
