#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::num::NonZero;
    use std::rc::Rc;
    use std::time::Duration;

    use petgraph::graphmap::UnGraphMap;
    use petgraph::visit::Dfs;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use strum::VariantArray;

    use crate::builder::{BuilderInvalidReason, PuzzleBuilder};
    use crate::catalog::{BestTimes, Catalog, Navigator};
    use crate::config::SessionConfig;
    use crate::data::{Difficulty, PuzzleData};
    use crate::direction::{Direction, Orientation};
    use crate::equivalence::Equivalence;
    use crate::error::DataError;
    use crate::geometry::{Point, Rect};
    use crate::grid::Grid;
    use crate::location::Location;
    use crate::node::{DisplayKey, Node, NodeId, PartKind, Rotation, Slot};
    use crate::port::{SessionListener, Surface};
    use crate::puzzle::Puzzle;
    use crate::session::{format_elapsed, Mode, PuzzleKey, Session};
    use crate::trace::trace;
    use crate::tween::{ActionState, AnimatedAction, MotionState, MovementBehavior};

    const TICK: Duration = Duration::from_millis(16);

    // source, one straight, sink along the top row
    fn line_puzzle() -> PuzzleData {
        PuzzleBuilder::with_size(NonZero::new(3).unwrap())
            .with_id(1)
            .add_source(Location(0, 0), Orientation::Horizontal)
            .add_sink(Location(2, 0), Orientation::Horizontal)
            .add_part(PartKind::Straight, Location(1, 0), Rotation::new(0))
            .build()
            .unwrap()
    }

    // turns a corner into a vertical sink
    fn bend_puzzle() -> PuzzleData {
        PuzzleBuilder::with_size(NonZero::new(3).unwrap())
            .with_id(2)
            .add_source(Location(0, 0), Orientation::Horizontal)
            .add_sink(Location(1, 2), Orientation::Vertical)
            .add_part(PartKind::Elbow, Location(1, 0), Rotation::new(3))
            .add_part(PartKind::Straight, Location(1, 1), Rotation::new(1))
            .build()
            .unwrap()
    }

    // one source feeding two sinks through a tee
    fn branch_puzzle() -> PuzzleData {
        PuzzleBuilder::with_size(NonZero::new(4).unwrap())
            .with_id(3)
            .add_source(Location(0, 1), Orientation::Horizontal)
            .add_sink(Location(3, 1), Orientation::Horizontal)
            .add_sink(Location(2, 3), Orientation::Vertical)
            .add_part(PartKind::Tee, Location(1, 1), Rotation::new(3))
            .add_part(PartKind::Straight, Location(2, 1), Rotation::new(0))
            .add_part(PartKind::Elbow, Location(1, 2), Rotation::new(1))
            .add_part(PartKind::Elbow, Location(2, 2), Rotation::new(3))
            .build()
            .unwrap()
    }

    // two independent flows crossing in the middle
    fn cross_puzzle() -> PuzzleData {
        PuzzleBuilder::with_size(NonZero::new(5).unwrap())
            .with_id(4)
            .add_source(Location(0, 2), Orientation::Horizontal)
            .add_source(Location(2, 0), Orientation::Vertical)
            .add_sink(Location(4, 2), Orientation::Horizontal)
            .add_sink(Location(2, 4), Orientation::Vertical)
            .add_part(PartKind::Straight, Location(1, 2), Rotation::new(0))
            .add_part(PartKind::Cross, Location(2, 2), Rotation::new(0))
            .add_part(PartKind::Straight, Location(3, 2), Rotation::new(0))
            .add_part(PartKind::Straight, Location(2, 1), Rotation::new(1))
            .add_part(PartKind::Straight, Location(2, 3), Rotation::new(1))
            .build()
            .unwrap()
    }

    fn solved(data: &PuzzleData) -> Puzzle {
        let mut puzzle = Puzzle::load(data).unwrap();
        puzzle.apply_solution();
        puzzle
    }

    // sink reachability computed independently of the tracer
    fn reachable_sinks(grid: &Grid) -> Vec<(NodeId, bool)> {
        let mut graph = UnGraphMap::<usize, ()>::new();
        for (id, _) in grid.nodes() {
            graph.add_node(id.index());
        }
        for pair in grid.links() {
            graph.add_edge(pair.0.index(), pair.1.index(), ());
        }

        grid.sinks()
            .iter()
            .map(|sink| {
                let lit = grid.sources().iter().any(|source| {
                    let mut dfs = Dfs::new(&graph, source.index());
                    while let Some(reached) = dfs.next(&graph) {
                        if reached == sink.index() {
                            return true;
                        }
                    }
                    false
                });
                (*sink, lit)
            })
            .collect()
    }

    #[test]
    fn load_places_only_terminals() {
        let puzzle = Puzzle::load(&line_puzzle()).unwrap();

        assert_eq!(format!("{}", puzzle.grid()), "S.d
...
...
");
        assert!(!puzzle.is_solved());
        assert!(puzzle.grid().movable().iter().all(|id| puzzle.grid()[*id].location().is_none()));
    }

    #[test]
    fn solve_straight_line() {
        let mut puzzle = solved(&line_puzzle());

        assert_eq!(format!("{}", puzzle.grid()), "S─D
...
...
");
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.grid().links().len(), 2);

        puzzle.select_at(Location(1, 0));
        puzzle.rotate_selected();
        assert_eq!(format!("{}", puzzle.grid()), "S│d
...
...
");
        assert!(!puzzle.is_solved());
        assert!(puzzle.grid().links().is_empty());
        assert_eq!(puzzle.selected(), None);

        puzzle.select_at(Location(1, 0));
        puzzle.rotate_selected_right();
        assert_eq!(format!("{}", puzzle.grid()), "S─D
...
...
");
        assert!(puzzle.is_solved());
    }

    #[test]
    fn solve_bend() {
        let puzzle = solved(&bend_puzzle());

        assert_eq!(format!("{}", puzzle.grid()), "S┐.
.│.
.D.
");
        assert!(puzzle.is_solved());
    }

    #[test]
    fn solve_branch() {
        let mut puzzle = solved(&branch_puzzle());

        assert_eq!(format!("{}", puzzle.grid()), "....
S┬─D
.└┐.
..D.
");
        assert!(puzzle.is_solved());

        // cutting the lower branch leaves the east sink lit
        puzzle.select_at(Location(2, 2));
        puzzle.move_selected(Location(3, 3));
        assert_eq!(format!("{}", puzzle.grid()), "....
S┬─D
.└..
..d┐
");
        assert!(!puzzle.is_solved());
        let lit = puzzle.sink_states().iter().map(|(_, lit)| *lit).collect::<Vec<_>>();
        assert_eq!(lit, vec![true, false]);
    }

    #[test]
    fn solve_crossing() {
        let puzzle = solved(&cross_puzzle());

        assert_eq!(format!("{}", puzzle.grid()), "..S..
..│..
S─┼─D
..│..
..D..
");
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.grid().links().len(), 8);
    }

    #[test]
    fn trace_follows_links_depth_first() {
        let puzzle = solved(&bend_puzzle());
        let grid = puzzle.grid();
        let source = grid.sources()[0];
        let sink = grid.sinks()[0];
        let elbow = grid.movable()[0];
        let straight = grid.movable()[1];

        assert_eq!(trace(grid, source), vec![source, elbow, straight, sink]);
        assert_eq!(trace(grid, straight), vec![straight, elbow, source, sink]);
    }

    #[test]
    fn trace_prefers_north_first() {
        let puzzle = solved(&branch_puzzle());
        let grid = puzzle.grid();
        let tee = grid.movable()[0];
        let path = trace(grid, tee);

        // north is open but unlinked, so east comes before south
        assert_eq!(path[0], tee);
        assert_eq!(path[1], grid.movable()[1]);
        assert_eq!(path.len(), grid.node_count());
    }

    #[test]
    fn trace_of_unplaced_node_is_itself() {
        let puzzle = Puzzle::load(&bend_puzzle()).unwrap();
        let grid = puzzle.grid();
        assert_eq!(trace(grid, grid.sources()[0]), vec![grid.sources()[0]]);
        assert_eq!(trace(grid, NodeId(99)), vec![]);
    }

    #[test]
    fn equivalence_merges_transitively() {
        let mut classes = Equivalence::new(4);
        assert!(classes.union(NodeId(0), NodeId(1)));
        assert!(classes.union(NodeId(1), NodeId(2)));
        assert!(!classes.union(NodeId(0), NodeId(2)));
        assert!(classes.equivalent(NodeId(0), NodeId(2)));
        assert!(!classes.equivalent(NodeId(0), NodeId(3)));
        assert!(!classes.union(NodeId(0), NodeId(4)));
        assert!(!classes.equivalent(NodeId(4), NodeId(4)));
    }

    #[test]
    fn is_solved_does_not_mutate() {
        let puzzle = solved(&branch_puzzle());
        let before = (format!("{}", puzzle.grid()), puzzle.grid().links(), puzzle.sink_states());
        assert!(puzzle.is_solved());
        assert!(puzzle.is_solved());
        let after = (format!("{}", puzzle.grid()), puzzle.grid().links(), puzzle.sink_states());
        assert_eq!(before, after);
    }

    #[test]
    fn invalid_input_is_ignored() {
        let mut puzzle = solved(&line_puzzle());
        let before = format!("{}", puzzle.grid());

        // stationary, empty, and off-board cells cannot be selected
        for location in [Location(0, 0), Location(2, 0), Location(1, 1), Location(7, 7)] {
            puzzle.select_at(location);
            assert_eq!(puzzle.selected(), None);
        }

        // nothing selected
        puzzle.rotate_selected();
        puzzle.move_selected(Location(1, 2));
        assert_eq!(format!("{}", puzzle.grid()), before);

        // occupied and off-board targets keep the selection
        puzzle.select_at(Location(1, 0));
        puzzle.move_selected(Location(2, 0));
        puzzle.move_selected(Location(3, 0));
        assert_eq!(format!("{}", puzzle.grid()), before);
        assert!(puzzle.selected().is_some());

        puzzle.unselect();
        assert_eq!(puzzle.selected(), None);
        assert!(puzzle.grid().is_consistent());
    }

    #[test]
    fn commits_only_into_free_cells() {
        let mut puzzle = Puzzle::load(&bend_puzzle()).unwrap();
        let plan = puzzle.solution_plan();
        let elbow = plan[0];

        assert!(puzzle.commit_placement(&elbow));
        // already placed
        assert!(!puzzle.commit_placement(&elbow));
        // a terminal cell
        let mut onto_source = plan[1];
        onto_source.location = Location(0, 0);
        assert!(!puzzle.commit_placement(&onto_source));

        assert!(puzzle.commit_solution(plan[1].node));
        assert!(!puzzle.commit_solution(puzzle.grid().sources()[0]));
        assert!(!puzzle.is_solved());

        puzzle.connect_all();
        assert!(puzzle.is_solved());
        assert!(puzzle.grid().is_consistent());
    }

    #[test]
    fn solution_commit_refused_when_target_taken() {
        let mut puzzle = solved(&bend_puzzle());
        let (elbow, straight) = (puzzle.grid().movable()[0], puzzle.grid().movable()[1]);

        puzzle.select_at(Location(1, 0));
        puzzle.move_selected(Location(0, 1));
        puzzle.select_at(Location(1, 1));
        puzzle.move_selected(Location(1, 0));
        let board = "S│.
┐..
.d.
";
        assert_eq!(format!("{}", puzzle.grid()), board);

        // the straight sits on the elbow's cell
        assert!(!puzzle.commit_solution(elbow));
        assert_eq!(puzzle.grid()[elbow].location(), Some(Location(0, 1)));
        assert_eq!(format!("{}", puzzle.grid()), board);
        assert!(puzzle.grid().is_consistent());

        assert!(puzzle.commit_solution(straight));
        assert!(puzzle.commit_solution(elbow));
        puzzle.connect_all();
        assert!(puzzle.is_solved());
    }

    #[test]
    fn solution_commit_reevaluates() {
        let mut puzzle = solved(&bend_puzzle());
        let straight = puzzle.grid().movable()[1];

        // already in place, but lifting drops its links
        assert!(puzzle.commit_solution(straight));
        assert_eq!(puzzle.grid().links().len(), 1);
        assert!(!puzzle.is_solved());
        assert_eq!(puzzle.sink_states(), reachable_sinks(puzzle.grid()));
        assert_eq!(format!("{}", puzzle.grid()), "S┐.
.│.
.d.
");

        puzzle.connect_all();
        assert!(puzzle.is_solved());
    }

    #[test]
    fn disconnect_clears_both_ends() {
        let mut puzzle = solved(&line_puzzle());
        assert_eq!(puzzle.disconnect(Location(1, 0)), 2);
        assert!(puzzle.grid().links().is_empty());
        assert_eq!(puzzle.disconnect(Location(1, 0)), 0);
        assert_eq!(puzzle.disconnect(Location(1, 1)), 0);

        assert_eq!(puzzle.connect(Location(1, 0)), 2);
        assert_eq!(puzzle.connect(Location(1, 0)), 0);
        puzzle.evaluate();
        assert!(puzzle.is_solved());

        puzzle.disconnect_all();
        assert!(puzzle.grid().links().is_empty());
        assert!(!puzzle.is_solved());
        let source = &puzzle.grid()[puzzle.grid().sources()[0]];
        assert_eq!(source.slot(Direction::North), Slot::Blocked);
        assert_eq!(source.slot(Direction::East), Slot::Open);
    }

    #[test]
    fn part_openings_by_rotation() {
        let openings = |kind: PartKind, turns: u8| {
            let mut node = Node::part(kind, None);
            node.rotate_by(turns);
            node.openings()
        };
        use Direction::*;

        assert_eq!(openings(PartKind::Elbow, 0), vec![East, South]);
        assert_eq!(openings(PartKind::Elbow, 1), vec![North, East]);
        assert_eq!(openings(PartKind::Elbow, 2), vec![North, West]);
        assert_eq!(openings(PartKind::Elbow, 3), vec![South, West]);
        assert_eq!(openings(PartKind::Straight, 0), vec![East, West]);
        assert_eq!(openings(PartKind::Straight, 1), vec![North, South]);
        assert_eq!(openings(PartKind::Tee, 0), vec![North, East, South]);
        assert_eq!(openings(PartKind::Tee, 1), vec![North, East, West]);
        assert_eq!(openings(PartKind::Cross, 3), vec![North, East, South, West]);

        let vertical = Node::terminal(PartKind::Sink, Orientation::Vertical, Location(0, 0));
        assert_eq!(vertical.openings(), vec![North, South]);
        assert_eq!(vertical.display_key(), DisplayKey::UnlitGauge);
    }

    #[test]
    fn rotation_from_factor() {
        let cases = [
            (0.0, 0),
            (0.5, 1),
            (1.0, 2),
            (1.5, 3),
            (0.25, 0),
            (0.26, 1),
            (0.75, 1),
            (1.25, 2),
            (1.75, 3),
            (1.76, 0),
            (2.0, 0),
            (2.5, 1),
            (-0.5, 3),
        ];
        for (factor, index) in cases {
            assert_eq!(Rotation::from_factor(factor).index(), index, "factor {}", factor);
        }

        let angles = (0..4).map(|i| Rotation::new(i).angle()).collect::<Vec<_>>();
        assert_eq!(angles, vec![0.0, std::f64::consts::FRAC_PI_2, std::f64::consts::PI, std::f64::consts::PI * 1.5]);
    }

    #[test]
    fn parse_puzzle_json() {
        let json = r#"{
            "id": 7,
            "size": 3,
            "sources": [{ "x": 0, "y": 0 }],
            "sinks": [{ "x": 2, "y": 0, "orientation": "horizontal" }],
            "solution": [{ "kind": "Pipe", "x": 1, "y": 0, "angle": 1.0 }]
        }"#;
        let data = PuzzleData::from_json(json).unwrap();
        assert_eq!(data.solution[0].part_kind().unwrap(), PartKind::Straight);
        assert_eq!(data.solution[0].target().rotation, Rotation::new(2));

        let puzzle = solved(&data);
        assert_eq!(format!("{}", puzzle.grid()), "S─D
...
...
");
    }

    #[test]
    fn reject_bad_puzzle_data() {
        let base = line_puzzle();

        let mut data = base.clone();
        data.solution[0].kind = "T_JUNCTION".into();
        assert!(data.validate().is_ok());

        data.solution[0].kind = "valve".into();
        assert!(matches!(data.validate(), Err(DataError::UnknownPartKind { .. })));

        data.solution[0].kind = "source".into();
        assert!(matches!(data.validate(), Err(DataError::StationaryInSolution { .. })));

        let mut data = base.clone();
        data.solution[0].x = 2;
        assert!(matches!(data.validate(), Err(DataError::Overlap { x: 2, y: 0 })));

        let mut data = base.clone();
        data.sinks[0].y = 3;
        assert!(matches!(data.validate(), Err(DataError::OutOfBounds { x: 2, y: 3, size: 3 })));

        let mut data = base.clone();
        data.solution.clear();
        assert!(matches!(Puzzle::load(&data), Err(DataError::MissingSolution { id: 1 })));

        let mut data = base.clone();
        data.sinks.clear();
        assert!(matches!(Puzzle::load(&data), Err(DataError::MissingSink { id: 1 })));

        let mut data = base.clone();
        data.size = 0;
        assert!(matches!(data.validate(), Err(DataError::EmptyGrid)));

        let mut data = base;
        data.solution[0].angle = f64::NAN;
        assert!(matches!(data.validate(), Err(DataError::BadAngle { .. })));

        assert!(matches!(PuzzleData::from_json("{ \"id\": 1 }"), Err(DataError::Malformed(_))));
    }

    #[test]
    fn builder_invalid_states() {
        let mut builder = PuzzleBuilder::with_size(NonZero::new(3).unwrap());
        builder.add_source(Location(0, 0), Orientation::Horizontal);
        let saved = builder.clone();

        builder.add_sink(Location(0, 3), Orientation::Horizontal);
        assert_eq!(builder.build().unwrap_err(), &vec![BuilderInvalidReason::FeatureOutOfBounds]);
        // invalid builders ignore further changes
        builder.add_sink(Location(0, 0), Orientation::Horizontal);
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::FeatureOutOfBounds]));

        let mut builder = saved.clone();
        builder.add_part(PartKind::Elbow, Location(0, 0), Rotation::new(0));
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::FeatureOverlap]));

        let mut builder = saved;
        builder.add_part(PartKind::Sink, Location(1, 1), Rotation::new(0));
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::StationaryPart]));
    }

    #[test]
    fn builder_pop_part() {
        let data = PuzzleBuilder::with_size(NonZero::new(3).unwrap())
            .add_source(Location(0, 0), Orientation::Horizontal)
            .add_sink(Location(2, 0), Orientation::Horizontal)
            .add_part(PartKind::Elbow, Location(1, 0), Rotation::new(0))
            .pop_part()
            .add_part(PartKind::Straight, Location(1, 0), Rotation::new(0))
            .build()
            .unwrap();

        assert_eq!(data.solution.len(), 1);
        assert_eq!(data.parts.straights, 1);
        assert_eq!(data.parts.elbows, 0);
        assert!(solved(&data).is_solved());
    }

    #[test]
    fn shuffle_registers_accidental_alignments() {
        for seed in 0..32 {
            let mut puzzle = Puzzle::load(&branch_puzzle()).unwrap();
            puzzle.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
            let links = puzzle.grid().links();
            puzzle.connect_all();
            assert_eq!(puzzle.grid().links(), links, "seed {}", seed);
            assert_eq!(puzzle.sink_states(), reachable_sinks(puzzle.grid()), "seed {}", seed);
        }
    }

    #[test]
    fn movement_eases_onto_destination() {
        let mut movement = MovementBehavior::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 0.0, 1.0, 5.0);
        let mut xs = vec![movement.position().x];
        let mut ticks = 0;

        while movement.state() == MotionState::Moving {
            movement.update();
            assert!(movement.speed() <= 5.0);
            xs.push(movement.position().x);
            ticks += 1;
            assert!(ticks < 1000, "never arrived");
        }

        assert!(xs.windows(2).all(|w| w[1] > w[0]), "not monotonic: {:?}", xs);
        assert!(xs.iter().all(|x| *x <= 100.0));
        assert_eq!(movement.position(), Point::new(100.0, 0.0));
        assert!(movement.has_arrived());

        // slowest at the ends, fastest around the middle
        let steps = xs.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
        let fastest = steps.iter().cloned().fold(0.0, f64::max);
        assert!(steps[0] < fastest);
        assert!(fastest > 4.0);
    }

    #[test]
    fn movement_already_there_is_idle() {
        let movement = MovementBehavior::new(Point::new(3.0, 4.0), Point::new(3.0, 4.0), 1.0, 1.0, 5.0);
        assert_eq!(movement.state(), MotionState::Idle);
        assert!(movement.has_arrived());
    }

    #[test]
    fn action_commits_once_on_arrival() {
        let movement = MovementBehavior::new(Point::new(0.0, 0.0), Point::new(0.0, 10.0), 0.0, 1.0, 5.0);
        let mut action = AnimatedAction::new(NodeId(0), DisplayKey::Elbow, movement, |log: &mut Vec<NodeId>| {
            log.push(NodeId(0))
        });
        let mut log = Vec::new();

        while action.state() == ActionState::Primary {
            assert!(log.is_empty());
            action.update(&mut log);
        }
        assert_eq!(action.state(), ActionState::Completion);
        assert_eq!(action.position(), Point::new(0.0, 10.0));
        assert_eq!(log, vec![NodeId(0)]);
        assert!(!action.ready_for_disposal());

        action.update(&mut log);
        assert!(action.ready_for_disposal());
        action.update(&mut log);
        assert_eq!(log, vec![NodeId(0)]);
    }

    #[derive(Clone, Default)]
    struct Recorder {
        solved: Rc<RefCell<Vec<(PuzzleKey, Duration)>>>,
        modes: Rc<RefCell<Vec<Mode>>>,
    }

    impl SessionListener for Recorder {
        fn solved(&mut self, puzzle: PuzzleKey, elapsed: Duration) {
            self.solved.borrow_mut().push((puzzle, elapsed));
        }

        fn mode_changed(&mut self, mode: Mode) {
            self.modes.borrow_mut().push(mode);
        }
    }

    #[derive(Default)]
    struct Canvas {
        frames: usize,
        tiles: usize,
        parts: Vec<(DisplayKey, Point)>,
    }

    impl Surface for Canvas {
        fn fill_background(&mut self) {
            self.frames += 1;
        }

        fn draw_tile(&mut self, _at: Point, _size: f64) {
            self.tiles += 1;
        }

        fn draw_part(&mut self, key: DisplayKey, at: Point, _size: f64, _angle: f64) {
            self.parts.push((key, at));
        }

        fn begin(&mut self, bounds: Rect) {
            assert!(bounds.size.width > 0.0);
        }
    }

    fn session(seed: u64) -> Session {
        Session::new(SessionConfig { seed: Some(seed), ..Default::default() }).unwrap()
    }

    fn settle(session: &mut Session) {
        for _ in 0..100_000 {
            if session.actions().is_empty() {
                return;
            }
            session.update(TICK);
        }
        panic!("animations never finished");
    }

    fn centre(session: &Session, location: Location) -> Point {
        let corner = session.geometry().grid_to_screen(location);
        Point::new(corner.x + session.cell_size() / 2.0, corner.y + session.cell_size() / 2.0)
    }

    #[test]
    fn session_shuffles_in_then_plays() {
        let mut session = session(5);
        let recorder = Recorder::default();
        session.set_listener(recorder.clone());
        session.load_puzzle(Difficulty::Medium, &branch_puzzle()).unwrap();

        assert_eq!(session.mode(), Mode::Shuffle);
        assert_eq!(session.actions().len(), 4);
        assert_eq!(session.key(), Some(PuzzleKey { tier: Difficulty::Medium, id: 3 }));

        // input is not forwarded while parts are in flight
        session.update(TICK);
        session.select_at(centre(&session, Location(0, 0)));
        assert_eq!(session.puzzle().unwrap().selected(), None);

        settle(&mut session);
        assert_eq!(session.mode(), Mode::NormalPlay);
        assert_eq!(*recorder.modes.borrow(), vec![Mode::NormalPlay]);

        let puzzle = session.puzzle().unwrap();
        let grid = puzzle.grid();
        assert!(grid.movable().iter().all(|id| grid[*id].location().is_some()));
        assert!(grid.is_consistent());
        assert_eq!(puzzle.sink_states(), reachable_sinks(grid));
    }

    #[test]
    fn session_solved_by_play() {
        let mut session = session(11);
        let recorder = Recorder::default();
        session.set_listener(recorder.clone());
        session.load_puzzle(Difficulty::Easy, &line_puzzle()).unwrap();
        settle(&mut session);

        let straight = session.puzzle().unwrap().grid().movable()[0];
        let location = |session: &Session| session.puzzle().unwrap().grid()[straight].location().unwrap();

        if location(&session) == Location(1, 0) {
            session.select_at(centre(&session, Location(1, 0)));
            session.move_selected(centre(&session, Location(0, 2)));
        }
        assert!(!session.is_solved());

        session.select_at(centre(&session, location(&session)));
        for _ in 0..5 {
            session.update(Duration::from_millis(10));
        }
        assert_eq!(session.elapsed(), Duration::from_millis(50));

        session.move_selected(centre(&session, Location(1, 0)));
        assert_eq!(location(&session), Location(1, 0));
        for _ in 0..4 {
            if session.is_solved() {
                break;
            }
            session.select_at(centre(&session, Location(1, 0)));
            session.rotate_selected();
        }

        assert!(session.is_solved());
        let key = PuzzleKey { tier: Difficulty::Easy, id: 1 };
        assert_eq!(*recorder.solved.borrow(), vec![(key, Duration::from_millis(50))]);

        // the clock stays stopped
        session.update(Duration::from_millis(10));
        assert_eq!(session.elapsed(), Duration::from_millis(50));
    }

    #[test]
    fn session_never_shuffles_into_a_solve() {
        for seed in 0..16 {
            let mut session = session(seed);
            let recorder = Recorder::default();
            session.set_listener(recorder.clone());
            session.load_puzzle(Difficulty::Easy, &line_puzzle()).unwrap();
            settle(&mut session);

            assert_eq!(session.mode(), Mode::NormalPlay, "seed {}", seed);
            assert!(!session.is_solved(), "seed {}", seed);
            assert!(recorder.solved.borrow().is_empty(), "seed {}", seed);
        }
    }

    #[test]
    fn session_reports_unavoidable_solve() {
        // the source already feeds the sink, so every shuffle lands solved
        let data = PuzzleBuilder::with_size(NonZero::new(2).unwrap())
            .with_id(9)
            .add_source(Location(0, 0), Orientation::Horizontal)
            .add_sink(Location(1, 0), Orientation::Horizontal)
            .add_part(PartKind::Cross, Location(0, 1), Rotation::new(0))
            .build()
            .unwrap();

        let mut session = session(2);
        let recorder = Recorder::default();
        session.set_listener(recorder.clone());
        session.load_puzzle(Difficulty::Easy, &data).unwrap();
        settle(&mut session);

        assert_eq!(session.mode(), Mode::NormalPlay);
        assert!(session.is_solved());
        let key = PuzzleKey { tier: Difficulty::Easy, id: 9 };
        assert_eq!(*recorder.solved.borrow(), vec![(key, Duration::ZERO)]);

        // the clock never runs
        let grid = session.puzzle().unwrap().grid();
        let at = grid[grid.movable()[0]].location().unwrap();
        session.select_at(centre(&session, at));
        session.update(TICK);
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn session_reveals_solution() {
        let mut session = session(3);
        session.load_puzzle(Difficulty::Easy, &bend_puzzle()).unwrap();

        // ignored while the shuffle is in flight
        session.reveal_solution();
        assert_eq!(session.mode(), Mode::Shuffle);
        settle(&mut session);

        session.reveal_solution();
        assert_eq!(session.mode(), Mode::Solution);
        assert_eq!(session.actions().len(), 2);
        {
            let grid = session.puzzle().unwrap().grid();
            assert!(grid.links().is_empty());
            assert!(grid.movable().iter().all(|id| grid[*id].location().is_none()));
        }

        // ignored while the solution is in flight
        session.reshuffle();
        assert_eq!(session.mode(), Mode::Solution);

        settle(&mut session);
        assert_eq!(session.mode(), Mode::Solution);
        assert!(session.is_solved());
        assert_eq!(format!("{}", session.puzzle().unwrap().grid()), "S┐.
.│.
.D.
");

        // input does nothing outside play
        session.select_at(centre(&session, Location(1, 0)));
        session.rotate_selected();
        assert!(session.is_solved());

        session.reshuffle();
        assert_eq!(session.mode(), Mode::Shuffle);
        assert_eq!(session.elapsed(), Duration::ZERO);
        settle(&mut session);
        assert_eq!(session.mode(), Mode::NormalPlay);
    }

    #[test]
    fn session_load_drops_flights() {
        let mut session = session(8);
        session.load_puzzle(Difficulty::Hard, &cross_puzzle()).unwrap();
        assert_eq!(session.actions().len(), 5);
        session.update(TICK);

        session.load_puzzle(Difficulty::Easy, &line_puzzle()).unwrap();
        assert_eq!(session.actions().len(), 1);
        assert_eq!(session.mode(), Mode::Shuffle);
        settle(&mut session);
        assert!(session.puzzle().unwrap().grid().is_consistent());
    }

    #[test]
    fn session_renders_by_mode() {
        let mut session = session(21);
        let mut canvas = Canvas::default();
        session.render(&mut canvas);
        assert_eq!((canvas.frames, canvas.tiles, canvas.parts.len()), (1, 0, 0));

        session.load_puzzle(Difficulty::Easy, &line_puzzle()).unwrap();
        let mut canvas = Canvas::default();
        session.render(&mut canvas);
        assert_eq!(canvas.tiles, 9);
        // two terminals in place, one part in flight
        assert_eq!(canvas.parts.len(), 3);
        assert_eq!(canvas.parts[2].0, DisplayKey::Straight);

        settle(&mut session);
        let straight = session.puzzle().unwrap().grid().movable()[0];
        let at = session.puzzle().unwrap().grid()[straight].location().unwrap();
        session.select_at(centre(&session, at));
        let pointer = Point::new(400.0, 400.0);
        session.set_drag(Some(pointer));

        let mut canvas = Canvas::default();
        session.render(&mut canvas);
        assert_eq!(canvas.parts.len(), 3);
        let half = session.cell_size() / 2.0;
        assert_eq!(canvas.parts[2], (DisplayKey::Straight, Point::new(pointer.x - half, pointer.y - half)));

        session.unselect();
        let mut canvas = Canvas::default();
        session.render(&mut canvas);
        assert_eq!(canvas.parts.len(), 3);
        assert_eq!(canvas.parts[2].1, session.geometry().grid_to_screen(at));
    }

    #[test]
    fn session_resize_refits_board() {
        let mut session = session(1);
        session.load_puzzle(Difficulty::Easy, &line_puzzle()).unwrap();
        assert_eq!(session.cell_size(), 264.0);

        session.resize(crate::geometry::Size::new(400.0, 300.0));
        assert_eq!(session.cell_size(), 97.0);
        assert_eq!(session.bounds().origin, Point::new(55.0, 5.0));
    }

    #[test]
    fn format_play_time() {
        assert_eq!(format_elapsed(Duration::ZERO), "0:00");
        assert_eq!(format_elapsed(Duration::from_millis(65_900)), "1:05");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1:02:05");
    }

    #[test]
    fn sample_catalog_is_solvable() {
        let catalog = Catalog::from_json(include_str!("../puzzles/sample.json")).unwrap();
        assert!(!catalog.is_empty());

        for tier in Difficulty::VARIANTS {
            let ids = catalog.tier(*tier).iter().map(|p| p.id).collect::<Vec<_>>();
            let mut sorted = ids.clone();
            sorted.sort();
            assert_eq!(ids, sorted);

            for data in catalog.tier(*tier) {
                assert!(solved(data).is_solved(), "{} puzzle {} is not solvable", tier, data.id);
            }
        }
    }

    #[test]
    fn navigate_catalog() {
        let mut catalog = Catalog::default();
        for (tier, data) in [
            (Difficulty::Easy, bend_puzzle()),
            (Difficulty::Easy, line_puzzle()),
            (Difficulty::Easy, branch_puzzle()),
            (Difficulty::Hard, cross_puzzle()),
        ] {
            catalog.insert(tier, data).unwrap();
        }
        assert_eq!(catalog.tier(Difficulty::Easy).iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(catalog.len(Difficulty::Medium), 0);

        let mut navigator = Navigator::new();
        assert_eq!(navigator.current(&catalog).map(|p| p.id), Some(1));
        assert_eq!(navigator.position_caption(&catalog), "#1 of 3");
        assert_eq!(navigator.previous(&catalog).map(|p| p.id), Some(3));
        assert_eq!(navigator.next(&catalog).map(|p| p.id), Some(1));
        assert_eq!(navigator.next(&catalog).map(|p| p.id), Some(2));
        assert_eq!(navigator.last(&catalog).map(|p| p.id), Some(3));
        assert_eq!(navigator.position_caption(&catalog), "#3 of 3");

        navigator.set_tier(Difficulty::Medium);
        assert_eq!(navigator.next(&catalog), None);
        assert_eq!(navigator.first(&catalog), None);

        navigator.set_tier(Difficulty::Hard);
        assert_eq!(navigator.current(&catalog).map(|p| p.id), Some(4));

        // each tier remembers its own position
        navigator.set_tier(Difficulty::Easy);
        assert_eq!(navigator.index(), 2);
        assert_eq!(navigator.first(&catalog).map(|p| p.id), Some(1));
    }

    #[test]
    fn best_times_keep_minimum() {
        let key = PuzzleKey { tier: Difficulty::Medium, id: 3 };
        let other = PuzzleKey { tier: Difficulty::Hard, id: 3 };
        let mut times = BestTimes::default();

        assert_eq!(times.best(key), None);
        assert!(times.record(key, Duration::from_secs(5)));
        assert!(!times.record(key, Duration::from_secs(7)));
        assert!(times.record(key, Duration::from_millis(3_250)));
        assert!(times.record(other, Duration::from_secs(9)));
        assert_eq!(times.best(key), Some(Duration::from_millis(3_250)));

        let restored = BestTimes::from_json(&times.to_json()).unwrap();
        assert_eq!(restored, times);
        assert_eq!(restored.best(other), Some(Duration::from_secs(9)));
    }

    fn apply(puzzle: &mut Puzzle, op: (u8, usize, usize, usize, usize)) {
        let (kind, ax, ay, bx, by) = op;
        puzzle.select_at(Location(ax, ay));
        match kind {
            0 => puzzle.rotate_selected(),
            1 => puzzle.rotate_selected_right(),
            _ => puzzle.move_selected(Location(bx, by)),
        }
    }

    proptest! {
        #[test]
        fn rotation_cycle_law(kind in prop::sample::select(PartKind::VARIANTS.to_vec()), turns in 0..16u8) {
            let rest = Node::part(kind, None);
            let mut node = rest.clone();
            node.rotate_by(turns);
            node.rotate_by(4 - turns % 4);
            prop_assert_eq!(node.slots, rest.slots);
            prop_assert_eq!(node.rotation, rest.rotation);

            for _ in 0..4 {
                node.rotate_left();
            }
            prop_assert_eq!(node.slots, rest.slots);

            node.rotate_left();
            node.rotate_right();
            prop_assert_eq!(node.slots, rest.slots);

            node.set_rotation(Rotation::new(turns));
            let mut expected = rest.clone();
            expected.rotate_by(turns);
            prop_assert_eq!(node.slots, expected.slots);
        }

        #[test]
        fn links_stay_symmetric(seed in any::<u64>(), ops in prop::collection::vec((0..3u8, 0..4usize, 0..4usize, 0..5usize, 0..5usize), 0..40)) {
            let mut puzzle = Puzzle::load(&branch_puzzle()).unwrap();
            puzzle.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
            prop_assert!(puzzle.grid().is_consistent());

            for op in ops {
                apply(&mut puzzle, op);
                prop_assert!(puzzle.grid().is_consistent());
                prop_assert_eq!(puzzle.sink_states(), reachable_sinks(puzzle.grid()));
            }
        }

        #[test]
        fn trace_is_bounded(seed in any::<u64>(), ops in prop::collection::vec((0..3u8, 0..5usize, 0..5usize, 0..5usize, 0..5usize), 0..20)) {
            let mut puzzle = Puzzle::load(&cross_puzzle()).unwrap();
            puzzle.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
            for op in ops {
                apply(&mut puzzle, op);
            }

            let grid = puzzle.grid();
            for (id, _) in grid.nodes() {
                let path = trace(grid, id);
                prop_assert!(path.len() <= grid.node_count());
                prop_assert_eq!(path[0], id);
                prop_assert_eq!(path.iter().collect::<HashSet<_>>().len(), path.len());
            }
        }

        #[test]
        fn shuffle_fills_distinct_free_cells(seed in any::<u64>()) {
            let mut puzzle = Puzzle::load(&cross_puzzle()).unwrap();
            let terminals = puzzle
                .grid()
                .sources()
                .iter()
                .chain(puzzle.grid().sinks())
                .filter_map(|id| puzzle.grid()[*id].location())
                .collect::<HashSet<_>>();

            let plan = puzzle.plan_shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
            prop_assert_eq!(plan.len(), puzzle.grid().movable().len());
            let cells = plan.iter().map(|p| p.location).collect::<HashSet<_>>();
            prop_assert_eq!(cells.len(), plan.len());
            prop_assert!(cells.is_disjoint(&terminals));

            for placement in &plan {
                prop_assert!(puzzle.commit_placement(placement));
            }
            prop_assert!(puzzle.grid().is_consistent());
            prop_assert!(puzzle.grid().links().is_empty());

            let grid = puzzle.grid();
            let placed = grid.nodes().filter_map(|(_, node)| node.location()).collect::<HashSet<_>>();
            prop_assert_eq!(placed.len(), grid.node_count());
        }
    }
}
