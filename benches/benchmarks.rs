use fishbait_core::cards::{Card, Rank, Suit};
use fishbait_core::engine::pot::hamilton_apportion;
use fishbait_core::engine::{AbstractAction, Action, Node};
use fishbait_core::evaluation::evaluate;
use fishbait_core::matchmaker::Matchmaker;
use fishbait_core::mccfr::{regret, Strategy};
use fishbait_core::sequence::SequenceTable;
use fishbait_core::PRUNE_CONSTANT;

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        evaluating_seven_card_hand,
        applying_a_hand_of_heads_up_actions,
        building_the_heads_up_sequence_table,
        apportioning_a_three_way_side_pot,
        regret_matching_a_ten_action_row,
        traversing_mccfr_one_iteration,
}

fn seven_cards() -> Vec<Card> {
    vec![
        Card::new(Rank::Ace, Suit::Spade),
        Card::new(Rank::King, Suit::Spade),
        Card::new(Rank::Queen, Suit::Spade),
        Card::new(Rank::Jack, Suit::Spade),
        Card::new(Rank::Ten, Suit::Spade),
        Card::new(Rank::Two, Suit::Heart),
        Card::new(Rank::Three, Suit::Club),
    ]
}

fn evaluating_seven_card_hand(c: &mut criterion::Criterion) {
    let cards = seven_cards();
    c.bench_function("evaluate a 7-card hand", |b| b.iter(|| evaluate(&cards)));
}

fn heads_up_actions() -> Vec<AbstractAction> {
    vec![
        AbstractAction::fold(),
        AbstractAction::check_call(),
        AbstractAction::bet(0.5),
        AbstractAction::bet(1.0),
        AbstractAction::all_in(),
    ]
}

fn applying_a_hand_of_heads_up_actions(c: &mut criterion::Criterion) {
    c.bench_function("play a heads-up hand to showdown", |b| {
        b.iter(|| {
            let mut node: Node<2> = Node::new([200, 200], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
            while node.in_progress() {
                if node.acting_player() == Node::<2>::CHANCE {
                    node.proceed_play().expect("chance node must proceed");
                    continue;
                }
                let action = if node.can_check_call() { Action::CheckCall } else { Action::Fold };
                node.apply(action).expect("legal action must apply");
            }
        })
    });
}

fn building_the_heads_up_sequence_table(c: &mut criterion::Criterion) {
    let start: Node<2> = Node::new([200, 200], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
    c.bench_function("build the heads-up sequence table", |b| {
        b.iter(|| SequenceTable::build(&start, heads_up_actions()))
    });
}

fn apportioning_a_three_way_side_pot(c: &mut criterion::Criterion) {
    let awards = vec![333.33, 333.33, 333.34];
    c.bench_function("apportion a 1000-chip three-way side pot", |b| {
        b.iter(|| hamilton_apportion(&awards, 1000).expect("apportionment must conserve the pot"))
    });
}

fn regret_matching_a_ten_action_row(c: &mut criterion::Criterion) {
    let regrets: Vec<i64> = (0..10).map(|i| i * 37 - 150).collect();
    c.bench_function("regret-match a 10-action row", |b| b.iter(|| regret::regret_match(&regrets)));
}

type TinyMatchmaker =
    Matchmaker<fn(fishbait_core::engine::Round, u64) -> usize, fn(fishbait_core::engine::Round) -> usize>;

fn tiny_matchmaker() -> TinyMatchmaker {
    fn cluster_fn(_round: fishbait_core::engine::Round, idx: u64) -> usize {
        (idx % 8) as usize
    }
    fn clusters_per_round(_round: fishbait_core::engine::Round) -> usize {
        8
    }
    Matchmaker::new(cluster_fn, clusters_per_round)
}

fn traversing_mccfr_one_iteration(c: &mut criterion::Criterion) {
    let start: Node<2> = Node::new([200, 200], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
    c.bench_function("traverse one heads-up MCCFR iteration", |b| {
        b.iter(|| {
            let mut strategy =
                Strategy::new(&start, heads_up_actions(), tiny_matchmaker(), evaluate, PRUNE_CONSTANT, 1);
            let mut node = start.clone();
            node.seed_node_rng(1);
            let buckets = [0usize; 2];
            strategy.traverse_mccfr(node, 0, false, buckets)
        })
    });
}
