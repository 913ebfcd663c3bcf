use std::fmt::Display;
use std::process::ExitCode;

use clap::Parser;
use lab_btree::{BTree, DEFAULT_ORDER};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Exercises a `BTree<i32, i32>` with sequential and random workloads.
///
/// With no arguments runs the built-in scenarios. With `ORDER N` runs N
/// inserts and N finds on a tree of order ORDER.
#[derive(Debug, Parser, PartialEq)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(help = "Order of the tree", requires = "n")]
    order: Option<usize>,
    #[clap(help = "Number of keys to insert and look up")]
    n: Option<usize>,
    #[clap(long, help = "Seed for the random workloads")]
    seed: Option<u64>,
}

type Data = Vec<(i32, i32)>;

fn make_int_data(rng: &mut StdRng, n: usize, random: bool) -> Data {
    if random {
        (0..n)
            .map(|_| {
                let key = rng.random_range(0..i32::MAX);
                (key, key)
            })
            .collect()
    } else {
        (0..n).map_while(|i| i32::try_from(i).ok()).map(|key| (key, key)).collect()
    }
}

fn do_inserts(data: &Data, tree: &mut BTree<i32, i32>) {
    for &(key, value) in data {
        tree.insert(key, value);
    }
}

fn verify_finds(data: &Data, tree: &BTree<i32, i32>) {
    for &(key, value) in data {
        match tree.find(&key) {
            Some(&found) if found == value => {}
            found => {
                println!("{found:?}");
                println!("ERROR: Value incorrect for key: {key}");
            }
        }
    }
}

fn print_tree<K: Display, V: Display>(tree: &BTree<K, V>) {
    let mut line = String::from("(root)");
    let mut current_depth = 0;
    for node in tree.traverse() {
        if node.depth() != current_depth {
            println!("{line}");
            line.clear();
            current_depth = node.depth();
        }
        let parent = node.parent_keys().first().map(|first| format!("({first})")).unwrap_or_default();
        for (key, value) in node.entries() {
            line.push_str(&format!("{parent}[{key}|{value}]"));
        }
        if node.depth() > 0 {
            line.push(' ');
        }
    }
    println!("{line}");
}

/// Inserts the sequential then the random workload, checking finds and
/// validity after each.
fn run_workloads(rng: &mut StdRng, tree: &mut BTree<i32, i32>, n: usize) {
    let order = tree.order();

    println!("Testing sequential data...");
    let data = make_int_data(rng, n, false);
    do_inserts(&data, tree);
    verify_finds(&data, tree);
    println!("BTree is valid? {}", tree.is_valid(order));
    tree.clear();

    println!("Testing random data...");
    let data = make_int_data(rng, n, true);
    do_inserts(&data, tree);
    verify_finds(&data, tree);
    println!("BTree is valid? {}", tree.is_valid(order));
    println!();
    info!("order {order}: {} distinct keys, height {}", tree.len(), tree.height());
}

fn small_btree_small_order() -> lab_btree::Result<()> {
    println!("small_btree_small_order");
    let data = vec![(1, 5), (4, 7), (5, 43), (-43, 3), (99, 2), (23, 7)];
    let mut tree = BTree::new(3)?;
    println!("Testing sequential data...");
    do_inserts(&data, &mut tree);
    verify_finds(&data, &tree);
    println!("BTree is valid? {}", tree.is_valid(3));
    println!("Proper value for key not in BTree? {}", tree.find(&-1).is_none());
    println!();
    Ok(())
}

fn large_btree_small_order(rng: &mut StdRng) -> lab_btree::Result<()> {
    println!("large_btree_small_order");
    let mut tree = BTree::new(3)?;
    run_workloads(rng, &mut tree, 2000);
    Ok(())
}

fn huge_btree_large_order(rng: &mut StdRng) -> lab_btree::Result<()> {
    println!("huge_btree_large_order");
    let mut tree = BTree::new(DEFAULT_ORDER)?;
    run_workloads(rng, &mut tree, 200_000);
    Ok(())
}

fn sequential_remove_test() -> lab_btree::Result<()> {
    println!("sequential_remove_test");
    let data = vec![
        (39, 5),
        (4, 7),
        (5, 43),
        (52, 3),
        (99, 2),
        (23, 7),
        (16, 2),
        (9, 4),
        (55, 1),
        (85, 3),
        (100, 3),
        (44, 14),
        (33, 4),
        (101, 54),
    ];
    let mut tree = BTree::new(3)?;
    do_inserts(&data, &mut tree);
    print_tree(&tree);

    for key in [23, 16, 100, 99, 101] {
        tree.remove(&key);
        println!("\n_________________after remove({key})_________________");
        print_tree(&tree);
    }
    tree.clear();
    Ok(())
}

fn generic_test(rng: &mut StdRng, order: usize, n: usize) -> lab_btree::Result<()> {
    let mut tree = BTree::new(order)?;
    run_workloads(rng, &mut tree, n);
    Ok(())
}

fn run(args: &Args) -> lab_btree::Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    match (args.order, args.n) {
        (Some(order), Some(n)) => generic_test(&mut rng, order, n),
        _ => {
            small_btree_small_order()?;
            large_btree_small_order(&mut rng)?;
            huge_btree_large_order(&mut rng)?;
            sequential_remove_test()
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
