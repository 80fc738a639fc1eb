use geo::{Area, LineString, Point, line_string};
use roadnet_core::prelude::*;

fn point(id: usize, x: f64, y: f64) -> QueryPoint {
    QueryPoint::new(id, Point::new(x, y))
}

/// A -> B costs 5 minutes, B -> C costs 3, both one-way along the geometry
fn one_way_chain() -> Network {
    let features = LineFeatures::from_lines([
        line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)],
        line_string![(x: 5.0, y: 0.0), (x: 8.0, y: 0.0)],
    ])
    .with_text("oneway", vec![Some("F".to_string()), Some("F".to_string())])
    .and_then(|f| f.with_numeric("ft", vec![Some(5.0), Some(3.0)]))
    .and_then(|f| f.with_numeric("tf", vec![Some(5.0), Some(3.0)]))
    .unwrap();

    NetworkBuilder::new(features)
        .make_directed_network(
            DirectionConfig::new("oneway", ("B", "F", "T")).with_minute_cols("ft", "tf"),
        )
        .build()
        .unwrap()
}

/// Undirected lines of 100 units along the x axis from 0 to 300
fn straight_chain() -> Network {
    NetworkBuilder::new(LineFeatures::from_lines([
        line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
        line_string![(x: 100.0, y: 0.0), (x: 200.0, y: 0.0)],
        line_string![(x: 200.0, y: 0.0), (x: 300.0, y: 0.0)],
    ]))
    .build()
    .unwrap()
}

/// Undirected 4 x 4 node grid with 100 unit spacing
fn grid() -> Network {
    let mut lines = Vec::new();
    for i in 0..4_i32 {
        for j in 0..3_i32 {
            let (a, b, c) = (f64::from(i) * 100.0, f64::from(j) * 100.0, f64::from(j + 1) * 100.0);
            lines.push(line_string![(x: b, y: a), (x: c, y: a)]);
            lines.push(line_string![(x: a, y: b), (x: a, y: c)]);
        }
    }
    NetworkBuilder::new(LineFeatures::from_lines(lines))
        .build()
        .unwrap()
}

fn meters(network: &Network) -> NetworkAnalysis<'_> {
    NetworkAnalysis::new(network, Rules::new("meters").with_search_tolerance(10.0)).unwrap()
}

#[test]
fn one_way_costs_follow_edge_direction() {
    let network = one_way_chain();
    let analysis =
        NetworkAnalysis::new(&network, Rules::new("minutes").with_search_tolerance(1.0)).unwrap();
    let a = [point(0, 0.0, 0.0)];
    let c = [point(1, 8.0, 0.0)];

    let forward = analysis.od_cost_matrix(&a, &c, false);
    assert_eq!(forward.len(), 1);
    assert_eq!(forward.cost(0, 1), Some(8.0));

    let backward = analysis.od_cost_matrix(&c, &a, false);
    assert_eq!(backward.len(), 1);
    assert_eq!(backward.rows()[0].cost, None);
    assert_eq!(backward.percent_missing(), 100.0);
}

#[test]
fn shortest_path_concatenates_edge_geometries() {
    let network = one_way_chain();
    let analysis =
        NetworkAnalysis::new(&network, Rules::new("minutes").with_search_tolerance(1.0)).unwrap();

    let ShortestPaths::Routes(rows) =
        analysis.shortest_path(&[point(0, 0.0, 0.0)], &[point(1, 8.0, 0.0)], false)
    else {
        panic!("expected routes");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cost, 8.0);
    assert_eq!(
        rows[0].geometry,
        line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 8.0, y: 0.0)]
    );
}

#[test]
fn unresolved_points_keep_rows_without_cost() {
    let network = straight_chain();
    let analysis = meters(&network);
    let far = point(7, 0.0, 5000.0);

    let matrix = analysis.od_cost_matrix(&[far, point(1, 0.0, 0.0)], &[point(2, 300.0, 0.0)], true);
    assert_eq!(matrix.len(), 2);
    assert_eq!(matrix.rows()[0].origin, 7);
    assert_eq!(matrix.rows()[0].cost, None);
    assert_eq!(matrix.rows()[0].geometry, None);
    assert_eq!(matrix.cost(1, 2), Some(300.0));
    assert!(matrix.rows()[1].geometry.is_some());
}

#[test]
fn resolver_expands_the_search_radius() {
    let network = straight_chain();
    let points = [
        point(0, 0.0, 3.0),
        point(1, 0.0, 30.0),
        point(2, 0.0, 3000.0),
        point(3, 0.0, 5.0),
    ];
    let resolutions = NodeResolver::new(&network).resolve(&points, 5.0, 10.0);

    let near = resolutions[0].snap().unwrap();
    assert_eq!(near.distance, 3.0);
    assert!(!near.expanded);

    let at_tolerance = resolutions[3].snap().unwrap();
    assert_eq!(at_tolerance.distance, 5.0);
    assert!(!at_tolerance.expanded);

    let expanded = resolutions[1].snap().unwrap();
    assert_eq!(expanded.distance, 30.0);
    assert!(expanded.expanded);

    assert!(resolutions[2].is_unreachable());
}

#[test]
fn many_to_one_matches_single_queries() {
    let network = grid();
    let analysis = meters(&network);
    let origins: Vec<QueryPoint> = (0..4)
        .map(|i| point(i, i as f64 * 100.0, 0.0))
        .collect();
    let destination = [point(9, 300.0, 300.0)];

    let matrix = analysis.od_cost_matrix(&origins, &destination, false);
    assert_eq!(matrix.len(), origins.len());
    for origin in &origins {
        let single = analysis.od_cost_matrix(std::slice::from_ref(origin), &destination, false);
        assert_eq!(matrix.cost(origin.id, 9), single.cost(origin.id, 9));
    }
    assert_eq!(matrix.cost(0, 9), Some(600.0));
    assert_eq!(matrix.cost(3, 9), Some(300.0));
}

#[test]
fn same_location_costs_nothing() {
    let network = grid();
    let analysis = meters(&network);
    let matrix = analysis.od_cost_matrix(&[point(0, 100.0, 100.0)], &[point(1, 100.0, 100.0)], false);
    assert_eq!(matrix.cost(0, 1), Some(0.0));

    let same_node = analysis.od_cost_matrix(&[point(0, 100.0, 103.0)], &[point(1, 103.0, 100.0)], false);
    assert_eq!(same_node.cost(0, 1), Some(0.0));
    let other_node = analysis.od_cost_matrix(&[point(0, 100.0, 103.0)], &[point(1, 200.0, 100.0)], false);
    assert!(other_node.cost(0, 1).unwrap() > 0.0);

    let ShortestPaths::Routes(rows) =
        analysis.shortest_path(&[point(0, 100.0, 100.0)], &[point(1, 100.0, 100.0)], false)
    else {
        panic!("expected routes");
    };
    assert!(rows.is_empty());
}

#[test]
fn zero_edge_routes_have_no_geometry() {
    let network = grid();
    let analysis = meters(&network);

    let same_point = analysis.od_cost_matrix(&[point(0, 100.0, 100.0)], &[point(1, 100.0, 100.0)], true);
    assert_eq!(same_point.rows()[0].cost, Some(0.0));
    assert_eq!(same_point.rows()[0].geometry, None);

    let same_node = analysis.od_cost_matrix(&[point(0, 0.0, 1.0)], &[point(1, 1.0, 0.0)], true);
    assert_eq!(same_node.rows()[0].cost, Some(0.0));
    assert_eq!(same_node.rows()[0].geometry, None);
}

#[test]
fn connector_cost_is_added_at_both_ends() {
    let network = straight_chain();
    let analysis = NetworkAnalysis::new(
        &network,
        Rules::new("meters")
            .with_search_tolerance(10.0)
            .with_connector(ConnectorCost::Multiplier(2.0)),
    )
    .unwrap();
    let matrix = analysis.od_cost_matrix(&[point(0, 0.0, 3.0)], &[point(1, 300.0, 4.0)], false);
    assert_eq!(matrix.cost(0, 1), Some(314.0));

    let network = one_way_chain();
    let analysis = NetworkAnalysis::new(
        &network,
        Rules::new("minutes")
            .with_search_tolerance(1.0)
            .with_connector(ConnectorCost::Kmh(6.0)),
    )
    .unwrap();
    // 0.5 m at 6 km/h is 0.005 minutes
    let matrix = analysis.od_cost_matrix(&[point(0, 0.0, 0.5)], &[point(1, 8.0, 0.5)], false);
    assert!((matrix.cost(0, 1).unwrap() - 8.01).abs() < 1e-9);
}

#[test]
fn mismatched_connector_is_rejected() {
    let network = straight_chain();
    let result = NetworkAnalysis::new(&network, Rules::new("meters").with_connector(ConnectorCost::Kmh(5.0)));
    assert!(matches!(result, Err(Error::InvalidRules(_))));
}

/// One-way triangle with a one-way spur leaving it
fn triangle_with_spur() -> LineFeatures {
    LineFeatures::from_lines([
        line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
        line_string![(x: 100.0, y: 0.0), (x: 50.0, y: 80.0)],
        line_string![(x: 50.0, y: 80.0), (x: 0.0, y: 0.0)],
        line_string![(x: 100.0, y: 0.0), (x: 200.0, y: 0.0)],
    ])
    .with_text("oneway", vec![Some("F".to_string()); 4])
    .unwrap()
}

#[test]
fn strongly_connected_policy_drops_one_way_spurs() {
    let config = DirectionConfig::new("oneway", ("B", "F", "T"));

    let weak = NetworkBuilder::new(triangle_with_spur())
        .make_directed_network(config.clone())
        .remove_isolated()
        .build()
        .unwrap();
    assert_eq!(weak.edge_count(), 4);

    let strong = NetworkBuilder::new(triangle_with_spur())
        .make_directed_network(config)
        .isolation_policy(IsolationPolicy::StronglyConnected)
        .build()
        .unwrap();
    assert_eq!(strong.edge_count(), 3);
    assert_eq!(strong.node_count(), 3);
    assert_eq!(strong.line_count(), 3);
}

#[test]
fn cut_lines_split_minutes_by_length() {
    let features = LineFeatures::from_lines([line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)]])
        .with_text("oneway", vec![Some("B".to_string())])
        .and_then(|f| f.with_numeric("ft", vec![Some(10.0)]))
        .and_then(|f| f.with_numeric("tf", vec![Some(20.0)]))
        .unwrap();
    let network = NetworkBuilder::new(features)
        .make_directed_network(
            DirectionConfig::new("oneway", ("B", "F", "T")).with_minute_cols("ft", "tf"),
        )
        .cut_lines(30.0)
        .build()
        .unwrap();
    assert_eq!(network.line_count(), 4);
    assert_eq!(network.edge_count(), 8);

    let analysis =
        NetworkAnalysis::new(&network, Rules::new("minutes").with_search_tolerance(1.0)).unwrap();
    let (start, end) = ([point(0, 0.0, 0.0)], [point(1, 100.0, 0.0)]);
    let forward = analysis.od_cost_matrix(&start, &end, false).cost(0, 1).unwrap();
    let backward = analysis.od_cost_matrix(&end, &start, false).cost(1, 0).unwrap();
    assert!((forward - 10.0).abs() < 1e-9);
    assert!((backward - 20.0).abs() < 1e-9);
}

#[test]
fn precise_area_from_a_line_position() {
    let network = NetworkBuilder::new(LineFeatures::from_lines([
        line_string![(x: 0.0, y: 0.0), (x: 300.0, y: 0.0)],
    ]))
    .build()
    .unwrap();
    let analysis = NetworkAnalysis::new(
        &network,
        Rules::new("meters")
            .with_search_tolerance(10.0)
            .with_split_lines(true),
    )
    .unwrap();
    let origin = [point(0, 100.0, 0.0)];

    let plain = analysis.service_area(&origin, &[50.0], false).unwrap();
    assert!(plain.is_empty());

    let ServiceAreas::Edges(rows) = analysis.precise_service_area(&origin, &[50.0], false).unwrap()
    else {
        panic!("expected edges");
    };
    assert_eq!(rows.len(), 2);
    let mut reached: Vec<(f64, f64)> = rows
        .iter()
        .map(|row| {
            let xs: Vec<f64> = row.geometry.0.iter().map(|coord| coord.x).collect();
            (xs.iter().copied().fold(f64::INFINITY, f64::min), xs.iter().copied().fold(0.0, f64::max))
        })
        .collect();
    reached.sort_by(|a, b| a.0.total_cmp(&b.0));
    assert!((reached[0].0 - 50.0).abs() < 1e-6 && (reached[0].1 - 100.0).abs() < 1e-6);
    assert!((reached[1].0 - 100.0).abs() < 1e-6 && (reached[1].1 - 150.0).abs() < 1e-6);
    assert!(rows.iter().all(|row| row.cost == 50.0));

    let wider = analysis.service_area(&origin, &[250.0], false).unwrap();
    assert_eq!(wider.len(), 2);
}

#[test]
fn dissolved_area_hull_covers_reached_lines() {
    let network = grid();
    let analysis = meters(&network);
    let ServiceAreas::Dissolved(areas) =
        analysis.service_area(&[point(0, 0.0, 0.0)], &[100.0], true).unwrap()
    else {
        panic!("expected dissolved areas");
    };
    let hull = areas[0].hull();
    assert!((hull.unsigned_area() - 5000.0).abs() < 1e-9);
}

#[test]
fn matrix_options_select_rows() {
    let network = straight_chain();
    let analysis = meters(&network);
    let origins = [point(0, 0.0, 0.0)];
    let destinations = [point(1, 300.0, 0.0), point(2, 100.0, 0.0), point(3, 200.0, 0.0)];

    let cheapest = analysis
        .od_cost_matrix_with(
            &origins,
            &destinations,
            &OdOptions {
                destination_count: Some(2),
                ..OdOptions::default()
            },
        )
        .unwrap();
    let kept: Vec<usize> = cheapest.rows().iter().map(|row| row.destination).collect();
    assert_eq!(kept, vec![2, 3]);

    let within = analysis
        .od_cost_matrix_with(
            &origins,
            &destinations,
            &OdOptions {
                cutoff: Some(250.0),
                ..OdOptions::default()
            },
        )
        .unwrap();
    assert_eq!(within.len(), 2);
    assert!(within.rows().iter().all(|row| row.cost.unwrap() < 250.0));
}

#[test]
fn rowwise_pairs_by_position() {
    let network = straight_chain();
    let analysis = meters(&network);
    let origins = [point(0, 0.0, 0.0), point(1, 100.0, 0.0)];
    let destinations = [point(2, 300.0, 0.0), point(3, 300.0, 0.0)];

    let options = OdOptions {
        rowwise: true,
        ..OdOptions::default()
    };
    let matrix = analysis
        .od_cost_matrix_with(&origins, &destinations, &options)
        .unwrap();
    assert_eq!(matrix.len(), 2);
    assert_eq!(matrix.cost(0, 2), Some(300.0));
    assert_eq!(matrix.cost(1, 3), Some(200.0));

    let mismatch = analysis.od_cost_matrix_with(&origins, &destinations[..1], &options);
    assert!(matches!(mismatch, Err(Error::InvalidInput(_))));
}

#[test]
fn summary_counts_paths_per_edge() {
    let network = straight_chain();
    let analysis = meters(&network);
    let origins = [point(0, 0.0, 0.0)];
    let destinations = [point(1, 200.0, 0.0), point(2, 300.0, 0.0)];

    let ShortestPaths::Summary(usage) = analysis.shortest_path(&origins, &destinations, true) else {
        panic!("expected a summary");
    };
    assert_eq!(usage.len(), 3);
    assert!(usage.iter().map(|row| row.n).sum::<usize>() >= destinations.len());
    assert!(usage.iter().all(|row| row.n > 0));
    let n_from = |x: f64| {
        usage
            .iter()
            .find(|row| row.geometry.0[0].x == x)
            .map(|row| row.n)
    };
    assert_eq!(n_from(0.0), Some(2));
    assert_eq!(n_from(100.0), Some(2));
    assert_eq!(n_from(200.0), Some(1));
    assert!(usage.iter().all(|row| row.frequency == row.n as f64));
}

#[test]
fn route_frequencies_sum_pair_weights() {
    let network = straight_chain();
    let analysis = meters(&network);
    let origins = [point(0, 0.0, 0.0)];
    let destinations = [point(1, 200.0, 0.0), point(2, 300.0, 0.0)];

    let usage = analysis.route_frequencies(&origins, &destinations, |_, destination| {
        if destination == 2 { 10.0 } else { 1.0 }
    });
    let frequency_from = |x: f64| {
        usage
            .iter()
            .find(|row| row.geometry.0[0].x == x)
            .map(|row| row.frequency)
    };
    assert_eq!(frequency_from(0.0), Some(11.0));
    assert_eq!(frequency_from(200.0), Some(10.0));
}

#[test]
fn k_routes_finds_alternatives() {
    let network = grid();
    let analysis = meters(&network);
    let rows = analysis
        .k_routes(&[point(0, 0.0, 0.0)], &[point(1, 300.0, 300.0)], 2, 50.0)
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].k, 1);
    assert_eq!(rows[1].k, 2);
    assert_eq!(rows[0].cost, 600.0);
    assert!(rows[1].cost >= rows[0].cost);
    assert_ne!(rows[0].geometry, rows[1].geometry);
}

#[test]
fn k_routes_rejects_bad_parameters() {
    let network = grid();
    let analysis = meters(&network);
    let (o, d) = ([point(0, 0.0, 0.0)], [point(1, 300.0, 300.0)]);
    assert!(matches!(analysis.k_routes(&o, &d, 0, 50.0), Err(Error::InvalidInput(_))));
    assert!(matches!(analysis.k_routes(&o, &d, 2, 150.0), Err(Error::InvalidInput(_))));
    assert!(matches!(analysis.k_routes(&o, &d, 2, -1.0), Err(Error::InvalidInput(_))));
}

#[test]
fn decreasing_breaks_are_rejected() {
    let network = grid();
    let analysis = meters(&network);
    let result = analysis.service_area(&[point(0, 0.0, 0.0)], &[5.0, 3.0], false);
    assert!(matches!(result, Err(Error::InvalidBreaks(_))));
}

fn area_edges(areas: ServiceAreas, break_value: f64) -> Vec<usize> {
    let ServiceAreas::Edges(edges) = areas else {
        panic!("expected edges");
    };
    let mut reached: Vec<usize> = edges
        .iter()
        .filter(|edge| edge.break_value == break_value)
        .map(|edge| edge.edge.index())
        .collect();
    reached.sort_unstable();
    reached.dedup();
    reached
}

#[test]
fn larger_breaks_reach_more_edges() {
    let network = grid();
    let analysis = meters(&network);
    let origin = [point(0, 100.0, 100.0)];
    let breaks = [100.0, 250.0];

    let small = area_edges(analysis.service_area(&origin, &breaks, false).unwrap(), 100.0);
    let large = area_edges(analysis.service_area(&origin, &breaks, false).unwrap(), 250.0);
    assert_eq!(small.len(), 4);
    assert!(large.len() > small.len());
    assert!(small.iter().all(|edge| large.contains(edge)));
}

#[test]
fn precise_area_adds_partial_edges() {
    let network = straight_chain();
    let analysis = meters(&network);
    let origin = [point(0, 0.0, 0.0)];

    let plain = analysis.service_area(&origin, &[150.0], false).unwrap();
    let precise = analysis.precise_service_area(&origin, &[150.0], false).unwrap();
    let plain_edges = area_edges(plain, 150.0);
    assert_eq!(plain_edges.len(), 1);

    let ServiceAreas::Edges(rows) = precise else {
        panic!("expected edges");
    };
    assert_eq!(rows.len(), 3);
    assert!(plain_edges.iter().all(|edge| rows.iter().any(|row| row.edge.index() == *edge)));
    let partial = rows
        .iter()
        .find(|row| row.geometry.0[0].x == 100.0 && row.geometry.0[1].x > 100.0)
        .unwrap();
    assert_eq!(partial.cost, 150.0);
    assert_eq!(
        partial.geometry,
        line_string![(x: 100.0, y: 0.0), (x: 150.0, y: 0.0)]
    );
}

#[test]
fn dissolved_area_has_one_row_per_break() {
    let network = grid();
    let analysis = meters(&network);
    let areas = analysis
        .service_area(&[point(0, 0.0, 0.0), point(1, 9000.0, 9000.0)], &[100.0, 200.0], true)
        .unwrap();
    let ServiceAreas::Dissolved(areas) = areas else {
        panic!("expected dissolved areas");
    };
    assert_eq!(areas.len(), 2);
    assert!(areas.iter().all(|area| area.origin == 0));
    assert_eq!(areas[0].geometry.0.len(), 2);
    assert!(areas[1].geometry.0.len() > areas[0].geometry.0.len());
}

#[test]
fn split_lines_route_along_the_line() {
    let network = NetworkBuilder::new(LineFeatures::from_lines([
        line_string![(x: 0.0, y: 0.0), (x: 300.0, y: 0.0)],
    ]))
    .build()
    .unwrap();
    let origins = [point(0, 40.0, 5.0)];
    let destinations = [point(1, 260.0, 5.0)];

    let nodes = NetworkAnalysis::new(&network, Rules::new("meters").with_search_tolerance(1000.0))
        .unwrap()
        .od_cost_matrix(&origins, &destinations, false);
    let on_lines = NetworkAnalysis::new(
        &network,
        Rules::new("meters")
            .with_search_tolerance(1000.0)
            .with_split_lines(true),
    )
    .unwrap()
    .od_cost_matrix(&origins, &destinations, true);

    assert_eq!(nodes.cost(0, 1), Some(300.0));
    let split = on_lines.cost(0, 1).unwrap();
    assert!((split - 220.0).abs() < 1e-6);
    assert!(split <= nodes.cost(0, 1).unwrap());

    let geometry: &LineString<f64> = on_lines.rows()[0].geometry.as_ref().unwrap();
    assert!((geometry.0[0].x - 40.0).abs() < 1e-6);
    assert!((geometry.0[geometry.0.len() - 1].x - 260.0).abs() < 1e-6);
}

#[test]
fn closed_holes_connect_the_network() {
    let lines = [
        line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
        line_string![(x: 103.0, y: 0.0), (x: 200.0, y: 0.0)],
    ];
    let open = NetworkBuilder::new(LineFeatures::from_lines(lines.clone()))
        .build()
        .unwrap();
    let closed = NetworkBuilder::new(LineFeatures::from_lines(lines))
        .close_network_holes(5.0, 30.0, 0.0)
        .build()
        .unwrap();
    assert_eq!(closed.lines().iter().filter(|line| line.is_hole()).count(), 1);

    let (origins, destinations) = ([point(0, 0.0, 0.0)], [point(1, 200.0, 0.0)]);
    assert_eq!(meters(&open).od_cost_matrix(&origins, &destinations, false).cost(0, 1), None);
    assert_eq!(
        meters(&closed).od_cost_matrix(&origins, &destinations, false).cost(0, 1),
        Some(200.0)
    );
}

#[test]
fn unknown_weight_is_an_error() {
    let network = grid();
    let result = NetworkAnalysis::new(&network, Rules::new("toll"));
    assert!(matches!(result, Err(Error::MissingWeight(weight)) if weight == "toll"));
}
