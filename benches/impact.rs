use callmap::config::ResolverConfig;
use callmap::impact::{parse_diff, ImpactMapper};
use callmap::indexer::{index_sources, Indexer, SourceFile};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// `count` classes in one package, each calling its neighbour.
fn synthetic_project(count: usize) -> Vec<SourceFile> {
    (0..count)
        .map(|idx| {
            let next = (idx + 1) % count;
            let source = format!(
                "package bench;\n\
                 \n\
                 public class C{idx} {{\n\
                 \x20   private C{next} next = null;\n\
                 \n\
                 \x20   public void run(int depth) {{\n\
                 \x20       if (depth > 0) {{\n\
                 \x20           next.run(depth - 1);\n\
                 \x20       }}\n\
                 \x20       helper();\n\
                 \x20   }}\n\
                 \n\
                 \x20   private void helper() {{\n\
                 \x20       C{next} other = new C{next}();\n\
                 \x20       other.run(0);\n\
                 \x20   }}\n\
                 }}\n"
            );
            SourceFile::in_memory(format!("bench/C{idx}.java"), source)
        })
        .collect()
}

fn bench_index_build(c: &mut Criterion) {
    let config = ResolverConfig::default();
    let mut group = c.benchmark_group("index_build");
    for count in [10usize, 100, 500] {
        let files = synthetic_project(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &files, |b, files| {
            b.iter(|| {
                let output = index_sources(black_box(&config), files.clone());
                black_box(output.stats)
            })
        });
    }
    group.finish();
}

fn bench_fixture_build(c: &mut Criterion) {
    let repo = fixture_path("java_service");
    c.bench_function("index_fixture_service", |b| {
        b.iter(|| {
            let output = Indexer::new(repo.clone(), ResolverConfig::default())
                .build()
                .unwrap();
            black_box(output.stats)
        })
    });
}

fn bench_diff_impact(c: &mut Criterion) {
    let repo = fixture_path("java_service");
    let config = ResolverConfig::default();
    let graph = Indexer::new(repo.clone(), config.clone())
        .build()
        .unwrap()
        .graph;
    let diff = "\
diff --git a/com/acme/service/OrderService.java b/com/acme/service/OrderService.java
@@ -24,3 +24,4 @@ public class OrderService extends BaseService {
         order.addItem(item);
-        repository.save(order);
+        repository.save(order);
+        notifier.send(order);
         notifier.send(order);
diff --git a/com/acme/model/Order.java b/com/acme/model/Order.java
@@ -20,2 +20,2 @@ public class Order {
-        long sum = 0;
+        long sum = 1;
         for (Item item : items) {
";

    c.bench_function("parse_diff", |b| b.iter(|| black_box(parse_diff(black_box(diff)))));

    let mapper = ImpactMapper::new(repo, &graph, &config);
    c.bench_function("analyze_diff_two_files", |b| {
        b.iter(|| black_box(mapper.analyze_diff(black_box(diff))))
    });
}

criterion_group!(benches, bench_index_build, bench_fixture_build, bench_diff_impact);
criterion_main!(benches);
