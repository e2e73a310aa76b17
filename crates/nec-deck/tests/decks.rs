use std::path::PathBuf;

use nec_context::{Context, ErrorKind, ResultSet};
use nec_deck::{
    CardDef, Deck, DeckError, ExcitationDef, GroundDef, GroundPlaneDef, SegmentDef,
    ValidationError, apply_deck, from_yaml_str, load_yaml, save_yaml,
};

fn deck_path(name: &str) -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("decks")
        .join(name)
}

#[test]
fn bundled_decks_validate() {
    for name in ["dipole_over_ground.yaml", "yagi_sweep.yaml"] {
        let path = deck_path(name);
        let result = load_yaml(&path);
        assert!(
            result.is_ok(),
            "deck failed validation: {} => {:?}",
            path.display(),
            result.err()
        );
    }
}

#[test]
fn reference_dipole_deck_runs() {
    let deck = load_yaml(&deck_path("dipole_over_ground.yaml")).unwrap();
    let mut ctx = Context::new();
    apply_deck(&deck, &mut ctx).unwrap();

    let max = ctx.gain_max(0).unwrap();
    assert!((7.5..9.5).contains(&max), "max gain {max}");
    assert_eq!(ctx.gain_min(0).unwrap(), -999.99);
    assert!(ctx.impedance(0).is_ok());
}

#[test]
fn roundtrip_yaml() {
    let deck = load_yaml(&deck_path("yagi_sweep.yaml")).unwrap();
    let path = std::env::temp_dir().join("nec_deck_roundtrip_yagi.yaml");
    save_yaml(&path, &deck).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(deck, loaded);
}

#[test]
fn yaml_defaults_fill_optional_fields() {
    let deck = from_yaml_str(
        r#"
version: 1
name: minimal
cards:
  - card: wire
    tag: 1
    segments: 5
    start: [0, 0, -0.25]
    end: [0, 0, 0.25]
    radius: 0.001
  - card: geometry_end
  - card: frequency
    start_mhz: 299.8
"#,
    )
    .unwrap();
    assert_eq!(
        deck.cards[1],
        CardDef::GeometryEnd {
            ground_plane: GroundPlaneDef::NoGround
        }
    );
    assert!(matches!(
        deck.cards[2],
        CardDef::Frequency { steps: 1, step, .. } if step == 0.0
    ));
}

#[test]
fn context_rejection_names_the_card() {
    let deck = Deck {
        version: 1,
        name: "bad source".to_string(),
        cards: vec![
            CardDef::Wire {
                tag: 1,
                segments: 3,
                start: [0.0, 0.0, 1.0],
                end: [0.0, 0.0, 2.0],
                radius: 0.01,
                taper: None,
            },
            CardDef::GeometryEnd {
                ground_plane: GroundPlaneDef::NoGround,
            },
            CardDef::Ground {
                ground: GroundDef::Perfect,
            },
            CardDef::Excitation {
                excitation: ExcitationDef::AppliedVoltage {
                    source: SegmentDef { tag: 1, segment: 9 },
                    voltage: [1.0, 0.0],
                },
            },
        ],
    };
    let mut ctx = Context::new();
    match apply_deck(&deck, &mut ctx) {
        Err(DeckError::Card {
            index: 3,
            card: "excitation",
            source,
        }) => assert_eq!(source.kind(), ErrorKind::InvalidParameter),
        other => panic!("unexpected outcome {other:?}"),
    }
    // Cards before the failing one stay applied.
    assert!(ctx.is_sealed());
    assert!(ctx.environment().ground.is_present());
}

#[test]
fn structural_errors_stop_before_the_context() {
    let deck = Deck {
        version: 1,
        name: "no geometry end".to_string(),
        cards: vec![CardDef::Wire {
            tag: 1,
            segments: 3,
            start: [0.0, 0.0, 1.0],
            end: [0.0, 0.0, 2.0],
            radius: 0.01,
            taper: None,
        }],
    };
    let mut ctx = Context::new();
    assert!(matches!(
        apply_deck(&deck, &mut ctx),
        Err(DeckError::Validation(ValidationError::MissingGeometryEnd))
    ));
    assert_eq!(ctx.segment_count().unwrap(), 0);
}

#[test]
fn sweep_deck_fills_every_step() {
    let deck = load_yaml(&deck_path("yagi_sweep.yaml")).unwrap();
    let mut ctx = Context::new();
    apply_deck(&deck, &mut ctx).unwrap();
    assert_eq!(ctx.step_count(), 10);
    assert_eq!(ctx.results().summaries().count(), 10);
    let currents = ctx
        .results()
        .at_step(9)
        .filter(|(_, set)| matches!(set, ResultSet::Currents(_)))
        .count();
    assert_eq!(currents, 1);
}
