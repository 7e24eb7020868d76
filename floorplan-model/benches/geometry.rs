use criterion::{black_box, criterion_group, criterion_main, Criterion};
use floorplan_model::{Point, Polygon};

fn irregular_room() -> Polygon {
    Polygon::new(vec![
        Point::new(314.0, 103.0),
        Point::new(394.0, 103.0),
        Point::new(394.0, 135.0),
        Point::new(527.0, 135.0),
        Point::new(527.0, 185.0),
        Point::new(600.0, 185.0),
        Point::new(600.0, 210.0),
        Point::new(527.0, 210.0),
        Point::new(527.0, 390.0),
        Point::new(500.0, 390.0),
        Point::new(500.0, 420.0),
        Point::new(470.0, 420.0),
        Point::new(470.0, 390.0),
        Point::new(314.0, 390.0),
    ])
    .unwrap()
}

fn bench_containment(c: &mut Criterion) {
    let room = irregular_room();
    let inside = Point::new(420.0, 250.0);
    c.bench_function("point_in_polygon", |b| {
        b.iter(|| black_box(&room).contains(black_box(&inside)))
    });
}

fn bench_area(c: &mut Criterion) {
    let room = irregular_room();
    c.bench_function("polygon_area", |b| b.iter(|| black_box(&room).area()));
}

criterion_group!(benches, bench_containment, bench_area);
criterion_main!(benches);
