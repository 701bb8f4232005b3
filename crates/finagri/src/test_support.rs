//! Shared fixtures for the front-end tests

use finagri_core::{SecurityDataset, read_securities};

const HEADER: &str = "Nom_Entreprise,Secteur,Annee,Prix_Cloture_Annuel,Variation(annee_precedente),Dividende_Verse,Nombre_Actions_restant,Capital_restant,Rendement_Dividende,Payeur_Stable";

/// CSV export with eight stable payers over 2019-2023, yields in percent.
pub fn market_csv() -> String {
    let securities = [
        ("snts", "Telecom", 6.5),
        ("orac", "Telecom", 7.2),
        ("sgbc", "Banque", 8.1),
        ("etit", "Banque", 3.0),
        ("sogc", "Agriculture", 5.8),
        ("palc", "Agriculture", 4.9),
        ("sivc", "Agriculture", 1.2),
        ("boab", "Banque", 9.0),
    ];
    let mut csv = format!("{HEADER}\n");
    for (k, (name, sector, yield_pct)) in securities.iter().enumerate() {
        let mut price = 1_000.0 * (k as f64 + 1.0);
        for (t, year) in (2019..=2023).enumerate() {
            let variation = 0.02 * ((t * (k + 1)) % 4) as f64 - 0.025;
            price *= 1.0 + variation;
            let pct = yield_pct + 0.2 * (t % 2) as f64;
            csv.push_str(&format!(
                "{name},{sector},{year},{price},{variation},{},1000000,0.5,{pct},Oui\n",
                price * pct / 100.0
            ));
        }
    }
    csv
}

pub fn market() -> SecurityDataset {
    read_securities(market_csv().as_bytes()).unwrap()
}
