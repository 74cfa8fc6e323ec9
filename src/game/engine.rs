use std::time::Duration;

use super::{
    action::Direction,
    config::GameConfig,
    state::{CollisionType, Consumable, GameState, GameStatus, Position, PowerUp, Snake},
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

/// Information about a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// What the head picked up this step
    pub consumed: Option<Consumable>,
    /// Type of collision if one occurred
    pub collision_type: Option<CollisionType>,
    /// Head position before it crossed a grid edge in wrap mode
    pub wrapped_from: Option<Position>,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Whether the game has terminated
    pub terminated: bool,
    /// Additional information about the step
    pub info: StepInfo,
}

impl StepResult {
    fn idle(terminated: bool) -> Self {
        Self {
            terminated,
            info: StepInfo {
                consumed: None,
                collision_type: None,
                wrapped_from: None,
            },
        }
    }
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Engine with a fixed seed, so fruit placement is reproducible
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Reset the game to initial state
    pub fn reset(&mut self) -> GameState {
        let center_x = (self.config.grid_width / 2) as i32;
        let center_y = (self.config.grid_height / 2) as i32;

        let snake = Snake::new(
            Position::new(center_x, center_y),
            Direction::Right,
            self.config.initial_snake_length,
        );

        // The fruit starts under the head so it does not mask a free cell
        let head = snake.head();
        let mut state = GameState::new(
            snake,
            head,
            self.config.grid_width,
            self.config.grid_height,
        );
        state.wrap_around = self.config.wrap_around;
        if let Some(cell) = self.free_cell(&state) {
            state.fruit = cell;
        }
        state
    }

    /// Queue a heading change for the next tick.
    ///
    /// A direct reversal of the current heading is dropped, as is any input
    /// while the game is not running.
    pub fn set_direction(&self, state: &mut GameState, direction: Direction) {
        if !state.is_running() {
            return;
        }
        if !state.snake.direction.is_opposite(direction) {
            state.pending_direction = direction;
        }
    }

    /// Start a fresh game if the game is over and `gesture` is the restart
    /// gesture (Up). Returns true when a new game began.
    pub fn handle_restart(&mut self, state: &mut GameState, gesture: Option<Direction>) -> bool {
        if state.is_over() && gesture == Some(Direction::Up) {
            let wrap_around = state.wrap_around;
            *state = self.reset();
            state.wrap_around = wrap_around;
            return true;
        }
        false
    }

    /// Time until the next tick for the current boost state
    pub fn tick_interval(&self, boosting: bool) -> Duration {
        self.config.tick_interval(boosting)
    }

    /// Execute one step of the game
    pub fn step(&mut self, state: &mut GameState) -> StepResult {
        if !state.is_running() {
            return StepResult::idle(state.is_over());
        }

        // Re-checked here since the heading may have changed since input arrived
        if !state.snake.direction.is_opposite(state.pending_direction) {
            state.snake.direction = state.pending_direction;
        }

        let head = state.snake.head();
        let mut new_head = head.moved_in_direction(state.snake.direction);
        let mut wrapped_from = None;

        if !state.is_in_bounds(new_head) {
            if state.wrap_around {
                wrapped_from = Some(head);
                new_head = state.wrapped(new_head);
            } else {
                return self.end_game(state, CollisionType::Wall);
            }
        }

        let consumed = if new_head == state.fruit {
            Some(Consumable::Fruit)
        } else if state.power_up_at(new_head) {
            Some(Consumable::PowerUp)
        } else {
            None
        };
        let grows = consumed.is_some();

        if state.snake.collides_on_advance(new_head, grows) {
            return self.end_game(state, CollisionType::SelfCollision);
        }

        state.snake.advance_to(new_head, grows);
        state.steps += 1;

        match consumed {
            Some(Consumable::PowerUp) => {
                state.score += self.config.power_up_points;
                state.power_up = None;
            }
            Some(Consumable::Fruit) => {
                state.score += self.config.fruit_points;
                self.age_power_up(state);
                match self.free_cell(state) {
                    Some(cell) => state.fruit = cell,
                    None => {
                        // Board is full
                        state.status = GameStatus::GameOver;
                        return StepResult {
                            terminated: true,
                            info: StepInfo {
                                consumed,
                                collision_type: None,
                                wrapped_from,
                            },
                        };
                    }
                }
                self.maybe_spawn_power_up(state);
            }
            None => self.age_power_up(state),
        }

        StepResult {
            terminated: false,
            info: StepInfo {
                consumed,
                collision_type: None,
                wrapped_from,
            },
        }
    }

    fn end_game(&self, state: &mut GameState, collision: CollisionType) -> StepResult {
        state.status = GameStatus::GameOver;
        state.steps += 1;

        StepResult {
            terminated: true,
            info: StepInfo {
                consumed: None,
                collision_type: Some(collision),
                wrapped_from: None,
            },
        }
    }

    fn age_power_up(&self, state: &mut GameState) {
        if let Some(power_up) = state.power_up.as_mut() {
            power_up.lifespan = power_up.lifespan.saturating_sub(1);
            if power_up.lifespan == 0 {
                state.power_up = None;
            }
        }
    }

    fn maybe_spawn_power_up(&mut self, state: &mut GameState) {
        if state.power_up.is_some() {
            return;
        }
        if state.score - state.last_power_up_score < self.config.power_up_score_step {
            return;
        }
        if !self.rng.gen_bool(self.config.power_up_spawn_chance) {
            return;
        }
        if let Some(position) = self.free_cell(state) {
            state.power_up = Some(PowerUp {
                position,
                lifespan: self.config.power_up_lifespan,
            });
            state.last_power_up_score = state.score;
        }
    }

    /// Pick a random cell not covered by the snake, the fruit or a power-up
    fn free_cell(&mut self, state: &GameState) -> Option<Position> {
        state.free_cells().choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> GameEngine {
        GameEngine::with_seed(GameConfig::small(), 7)
    }

    #[test]
    fn test_reset() {
        let mut engine = GameEngine::new(GameConfig::default());
        let state = engine.reset();

        assert!(state.is_running());
        assert_eq!(state.score, 0);
        assert_eq!(state.steps, 0);
        assert_eq!(state.snake.body.len(), 3);
        assert!(!state.is_occupied_by_snake(state.fruit));
        assert!(state.power_up.is_none());
    }

    #[test]
    fn test_basic_movement() {
        let mut engine = engine();
        let mut state = engine.reset();
        state.fruit = Position::new(0, 0);
        let initial_head = state.snake.head();

        let result = engine.step(&mut state);

        assert!(!result.terminated);
        assert!(result.info.consumed.is_none());
        assert_eq!(state.steps, 1);
        assert_eq!(state.snake.body.len(), 3);
        assert_eq!(state.snake.head(), initial_head.moved_by(1, 0));
    }

    #[test]
    fn test_fruit_consumption() {
        let mut engine = engine();
        let mut state = engine.reset();

        // Place fruit directly in front of snake
        let head = state.snake.head();
        state.fruit = head.moved_in_direction(state.snake.direction);
        let initial_length = state.snake.body.len();

        let result = engine.step(&mut state);

        assert_eq!(result.info.consumed, Some(Consumable::Fruit));
        assert_eq!(state.score, 10);
        assert_eq!(state.snake.body.len(), initial_length + 1);
        assert!(!state.is_occupied_by_snake(state.fruit));
    }

    #[test]
    fn test_power_up_consumption() {
        let mut engine = engine();
        let mut state = engine.reset();
        state.fruit = Position::new(0, 0);
        let ahead = state.snake.head().moved_by(1, 0);
        state.power_up = Some(PowerUp {
            position: ahead,
            lifespan: 50,
        });

        let result = engine.step(&mut state);

        assert_eq!(result.info.consumed, Some(Consumable::PowerUp));
        assert_eq!(state.score, 20);
        assert_eq!(state.snake.body.len(), 4);
        assert!(state.power_up.is_none());
    }

    #[test]
    fn test_power_up_despawns() {
        let mut engine = engine();
        let mut state = engine.reset();
        state.fruit = Position::new(0, 0);
        state.power_up = Some(PowerUp {
            position: Position::new(0, 9),
            lifespan: 2,
        });

        engine.step(&mut state);
        assert_eq!(state.power_up.map(|p| p.lifespan), Some(1));
        engine.step(&mut state);
        assert!(state.power_up.is_none());
    }

    #[test]
    fn test_power_up_requires_score_step() {
        let config = GameConfig {
            power_up_spawn_chance: 1.0,
            ..GameConfig::small()
        };
        let mut engine = GameEngine::with_seed(config, 3);
        let mut state = engine.reset();

        // Two fruits: 20 points, below the 30 point step
        for _ in 0..2 {
            state.fruit = state.snake.head().moved_in_direction(state.snake.direction);
            engine.step(&mut state);
        }
        assert_eq!(state.score, 20);
        assert!(state.power_up.is_none());

        state.snake.direction = Direction::Down;
        state.pending_direction = Direction::Down;
        state.fruit = state.snake.head().moved_in_direction(Direction::Down);
        engine.step(&mut state);

        assert_eq!(state.score, 30);
        let power_up = state.power_up.expect("power-up after 30 points");
        assert_eq!(state.last_power_up_score, 30);
        assert_ne!(power_up.position, state.fruit);
        assert!(!state.is_occupied_by_snake(power_up.position));
    }

    #[test]
    fn test_wall_collision() {
        let mut engine = engine();
        let mut state = GameState::new(
            Snake::new(Position::new(0, 5), Direction::Left, 3),
            Position::new(5, 5),
            10,
            10,
        );

        let result = engine.step(&mut state);

        assert!(result.terminated);
        assert!(state.is_over());
        assert_eq!(result.info.collision_type, Some(CollisionType::Wall));
    }

    #[test]
    fn test_wrap_around() {
        let mut engine = engine();
        let mut state = GameState::new(
            Snake::new(Position::new(0, 5), Direction::Left, 3),
            Position::new(5, 5),
            10,
            10,
        );
        state.wrap_around = true;

        let result = engine.step(&mut state);

        assert!(!result.terminated);
        assert_eq!(state.snake.head(), Position::new(9, 5));
        assert_eq!(result.info.wrapped_from, Some(Position::new(0, 5)));
    }

    #[test]
    fn test_self_collision() {
        let mut engine = engine();

        // Body: (5,5), (4,5), (3,5), (2,5), (1,5)
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 5);
        let mut state = GameState::new(snake, Position::new(8, 8), 10, 10);

        // Down: (5,6), (5,5), (4,5), (3,5), (2,5)
        engine.set_direction(&mut state, Direction::Down);
        engine.step(&mut state);
        // Left: (4,6), (5,6), (5,5), (4,5), (3,5)
        engine.set_direction(&mut state, Direction::Left);
        engine.step(&mut state);
        // Up: (4,5) is a body segment, not the tail
        engine.set_direction(&mut state, Direction::Up);
        let result = engine.step(&mut state);

        assert!(result.terminated);
        assert!(state.is_over());
        assert_eq!(
            result.info.collision_type,
            Some(CollisionType::SelfCollision)
        );
    }

    #[test]
    fn test_moving_into_vacating_tail() {
        let mut engine = engine();

        // A 2x2 loop: the head chases the tail cell as it vacates
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 4);
        let mut state = GameState::new(snake, Position::new(8, 8), 10, 10);

        engine.set_direction(&mut state, Direction::Down);
        engine.step(&mut state);
        engine.set_direction(&mut state, Direction::Left);
        engine.step(&mut state);
        engine.set_direction(&mut state, Direction::Up);
        let result = engine.step(&mut state);

        assert!(!result.terminated);
        assert_eq!(state.snake.head(), Position::new(4, 5));
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let mut engine = engine();
        let mut state = engine.reset();
        state.fruit = Position::new(0, 0);
        let head = state.snake.head();

        engine.set_direction(&mut state, Direction::Left);
        engine.step(&mut state);

        assert_eq!(state.snake.direction, Direction::Right);
        assert_eq!(state.snake.head(), head.moved_by(1, 0));
        assert!(state.is_running());
    }

    #[test]
    fn test_reverse_after_quick_turns_is_ignored() {
        let mut engine = engine();
        let mut state = engine.reset();
        state.fruit = Position::new(0, 0);

        // Up is accepted as pending, then Left would reverse the
        // still-current Right heading
        engine.set_direction(&mut state, Direction::Up);
        engine.set_direction(&mut state, Direction::Left);
        assert_eq!(state.pending_direction, Direction::Up);

        engine.step(&mut state);
        assert_eq!(state.snake.direction, Direction::Up);
    }

    #[test]
    fn test_paused_game_does_not_move() {
        let mut engine = engine();
        let mut state = engine.reset();
        let before = state.clone();

        state.toggle_pause();
        let result = engine.step(&mut state);

        assert!(!result.terminated);
        assert_eq!(state.snake, before.snake);
        assert_eq!(state.steps, 0);
    }

    #[test]
    fn test_terminated_game_no_update() {
        let mut engine = engine();
        let mut state = engine.reset();
        state.status = GameStatus::GameOver;
        let steps_before = state.steps;

        let result = engine.step(&mut state);

        assert!(result.terminated);
        assert_eq!(state.steps, steps_before); // Should not increment
    }

    #[test]
    fn test_restart_only_on_up() {
        let mut engine = engine();
        let mut state = engine.reset();
        state.score = 40;
        state.status = GameStatus::GameOver;

        assert!(!engine.handle_restart(&mut state, Some(Direction::Left)));
        assert!(!engine.handle_restart(&mut state, None));
        assert!(state.is_over());

        assert!(engine.handle_restart(&mut state, Some(Direction::Up)));
        assert!(state.is_running());
        assert_eq!(state.score, 0);
        assert_eq!(state.snake.body.len(), 3);
    }

    #[test]
    fn test_restart_ignored_while_running() {
        let mut engine = engine();
        let mut state = engine.reset();
        state.score = 10;

        assert!(!engine.handle_restart(&mut state, Some(Direction::Up)));
        assert_eq!(state.score, 10);
    }

    #[test]
    fn test_length_only_grows_on_consumption() {
        let mut engine = GameEngine::with_seed(GameConfig::new(12, 12), 11);
        let mut state = engine.reset();
        state.wrap_around = true;
        let turns = [
            Direction::Right,
            Direction::Down,
            Direction::Left,
            Direction::Down,
            Direction::Right,
        ];

        for i in 0..200 {
            engine.set_direction(&mut state, turns[(i / 7) % turns.len()]);
            let before = state.snake.body.len();
            let result = engine.step(&mut state);
            if result.terminated {
                break;
            }
            let expected = before + usize::from(result.info.consumed.is_some());
            assert_eq!(state.snake.body.len(), expected);
        }
    }
}
