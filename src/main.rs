//! Battle Sim demo runner.
//!
//! Plays a heuristic-vs-heuristic battle, records every command, replays the
//! recording on a fresh engine and checks that both snapshots hash the same.
//!
//! Usage: `battle-sim [seed] [max-rounds]`

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use battle_sim::battle::{
    Action, ActionKind, BattleEngine, Combatant, CombatantId, DecisionSources, DjinnMode,
    Element, EngineOptions, EventData, HeuristicDecisions, ItemEffect, RecordingDecisions,
    RunOptions, Side, SpecialEffect, Stats, StatusId, TargetScope,
};
use battle_sim::core::HexDigest;
use battle_sim::VERSION;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().unwrap_or_else(|| "demo".to_string());
    let max_rounds = match args.next() {
        Some(raw) => raw.parse::<u32>().with_context(|| format!("invalid max-rounds {raw:?}"))?,
        None => 50,
    };

    info!("Battle Sim v{}", VERSION);
    info!("Seed: {:?}, round cap: {}", seed, max_rounds);

    let (players, enemies) = demo_rosters();
    let options = EngineOptions::default().with_seed(seed.clone());
    let run_options = RunOptions { max_rounds: Some(max_rounds) };

    // === Live battle ===
    let mut recorders: BTreeMap<CombatantId, RecordingDecisions<HeuristicDecisions>> = players
        .iter()
        .chain(enemies.iter())
        .map(|c| (c.id.clone(), RecordingDecisions::new(HeuristicDecisions::default())))
        .collect();

    let mut engine = BattleEngine::new(&players, &enemies, options.clone());
    let mut sources: DecisionSources<'_> = BTreeMap::new();
    for (id, recorder) in recorders.iter_mut() {
        sources.insert(id.clone(), Box::new(recorder));
    }
    let snapshot = engine.run(sources, run_options)?;

    for event in &snapshot.log {
        match &event.data {
            EventData::Damage { target, amount, critical: true, .. } => {
                info!("Round {}: critical hit on {} for {}", event.round, target, amount);
            }
            EventData::Message { text } => info!("Round {}: {}", event.round, text),
            _ => {}
        }
    }

    info!("=== Battle Results ===");
    info!("Outcome: {:?} after {} rounds", snapshot.outcome, snapshot.round);
    for c in snapshot.parties.players.iter().chain(snapshot.parties.enemies.iter()) {
        info!("{:<12} HP {:>3}/{:<3} PP {:>2}/{:<2}", c.name, c.stats.hp, c.stats.max_hp, c.stats.pp, c.stats.max_pp);
    }
    let hash = snapshot.digest()?;
    info!("Snapshot digest: {}", HexDigest(&hash));
    info!("Total events: {}", snapshot.log.len());

    // === Replay ===
    info!("=== Verifying Determinism ===");
    let mut replay = BattleEngine::new(&players, &enemies, options);
    let mut sources: DecisionSources<'_> = BTreeMap::new();
    for (id, recorder) in &recorders {
        sources.insert(id.clone(), Box::new(recorder.replay()));
    }
    let replayed = replay.run(sources, run_options)?;
    let replay_hash = replayed.digest()?;
    info!("Replay digest:   {}", HexDigest(&replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: replay digest differs");
    }
    info!("DETERMINISM VERIFIED: digests match");
    Ok(())
}

fn demo_rosters() -> (Vec<Combatant>, Vec<Combatant>) {
    let special = |id: &str, name: &str, element, cost, power, effect, target| {
        Action::new(id, name, ActionKind::Special { element, cost, power, effect }, target)
    };
    let djinn = |id: &str, name: &str, element, mode| {
        Action::new(id, name, ActionKind::Djinn { element, mode, power: 0.6 }, TargetScope::Single)
    };

    let isaac = Combatant::new(
        "isaac",
        "Isaac",
        Side::Ally,
        Stats::new(120, 30, 18, 10, 12, 6).with_element(Element::Venus),
        vec![
            Action::attack(),
            special("quake", "Quake", Element::Venus, 6, 1.4, None, TargetScope::AllEnemies),
            djinn("flint-set", "Flint", Element::Venus, DjinnMode::Ready),
            djinn("flint", "Flint Burst", Element::Venus, DjinnMode::Release),
            Action::new(
                "judgment",
                "Judgment",
                ActionKind::Summon { element: Element::Venus, power: 2.0, required: 2 },
                TargetScope::AllEnemies,
            ),
            Action::defend(0.5),
        ],
    );
    let garet = Combatant::new(
        "garet",
        "Garet",
        Side::Ally,
        Stats::new(140, 20, 20, 12, 8, 4).with_element(Element::Mars),
        vec![
            Action::attack(),
            special("flare", "Flare", Element::Mars, 5, 1.5, None, TargetScope::Single),
            djinn("forge-set", "Forge", Element::Mars, DjinnMode::Ready),
        ],
    );
    let mia = Combatant::new(
        "mia",
        "Mia",
        Side::Ally,
        Stats::new(100, 40, 12, 8, 11, 8).with_element(Element::Mercury),
        vec![
            Action::attack(),
            special("ply", "Ply", Element::Mercury, 4, 30.0, Some(SpecialEffect::Heal), TargetScope::Single),
            special("cure-poison", "Cure Poison", Element::Mercury, 2, 0.0, Some(SpecialEffect::Cleanse), TargetScope::AllAllies),
            Action::new("water-of-life", "Water of Life", ActionKind::Item { effect: ItemEffect::Revive, power: 50.0 }, TargetScope::Single),
        ],
    );

    let lizard = Combatant::new(
        "lizard-man",
        "Lizard Man",
        Side::Enemy,
        Stats::new(150, 20, 17, 11, 10, 5).with_element(Element::Mars),
        vec![
            Action::attack(),
            special("venom", "Venom Fang", Element::Mars, 5, 1.2, Some(SpecialEffect::Afflict(StatusId::Poison)), TargetScope::Single),
        ],
    );
    let harpy = Combatant::new(
        "harpy",
        "Harpy",
        Side::Enemy,
        Stats::new(90, 24, 14, 7, 16, 10).with_element(Element::Jupiter),
        vec![
            Action::attack(),
            special("whirlwind", "Whirlwind", Element::Jupiter, 6, 1.1, None, TargetScope::AllEnemies),
        ],
    );

    (vec![isaac, garet, mia], vec![lizard, harpy])
}
