use boost_engine::{
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    ClaimApi,
    ClaimOutcome,
    CommissionApi,
    LedgerApi,
    PaymentEventApi,
    SqliteDatabase,
    WebhookAck,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct BoostWorld {
    pub system: Option<BoostSystem>,
    pub claim_outcomes: Vec<ClaimOutcome>,
    pub last_ack: Option<WebhookAck>,
}

#[derive(Debug)]
pub struct BoostSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub ledger: LedgerApi<SqliteDatabase>,
    pub claims: ClaimApi<SqliteDatabase>,
    pub commission: CommissionApi<SqliteDatabase>,
    pub payments: PaymentEventApi<SqliteDatabase>,
}

impl BoostWorld {
    pub fn system(&self) -> &BoostSystem {
        self.system.as_ref().expect("The system has not been initialised. Start with 'Given a fresh install'")
    }

    pub fn last_outcome(&self) -> &ClaimOutcome {
        self.claim_outcomes.last().expect("No claims have been made")
    }
}

impl BoostSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        create_database(&url).await;
        let db = run_migrations(&url).await;
        debug!("Created database: {url}");
        let producers = EventProducers::default();
        Self {
            db_path: url,
            ledger: LedgerApi::new(db.clone(), producers.clone()),
            claims: ClaimApi::new(db.clone(), producers.clone()),
            commission: CommissionApi::new(db.clone()),
            payments: PaymentEventApi::new(db.clone(), producers),
            db,
        }
    }
}
