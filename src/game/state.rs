use super::action::Direction;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    pub body: Vec<Position>,
    /// Current direction of movement
    pub direction: Direction,
}

impl Snake {
    /// Create a new snake with given starting position and direction
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let mut body = vec![head];

        // Add initial body segments behind the head
        let (dx, dy) = direction.delta();
        let (back_dx, back_dy) = (-dx, -dy);

        for i in 1..length {
            let prev = body[i - 1];
            body.push(prev.moved_by(back_dx, back_dy));
        }

        Self { body, direction }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Check whether moving the head onto `pos` runs into the body.
    ///
    /// The tail vacates its cell on a normal move, so it only counts when the
    /// snake is growing this tick.
    pub fn collides_on_advance(&self, pos: Position, growing: bool) -> bool {
        let solid = if growing {
            self.body.len()
        } else {
            self.body.len() - 1
        };
        self.body[..solid].contains(&pos)
    }

    /// Push a new head, keeping the tail when growing
    pub fn advance_to(&mut self, new_head: Position, grow: bool) {
        self.body.insert(0, new_head);

        if !grow {
            self.body.pop();
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }
}

/// Type of collision that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    /// Snake hit a wall
    Wall,
    /// Snake hit itself
    SelfCollision,
}

/// What the head picked up on a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumable {
    Fruit,
    PowerUp,
}

/// A bonus item that despawns after its lifespan runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerUp {
    pub position: Position,
    /// Remaining ticks before it disappears
    pub lifespan: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Running,
    Paused,
    GameOver,
}

/// Complete game state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    /// Heading requested by input, applied at the next tick
    pub pending_direction: Direction,
    pub fruit: Position,
    pub power_up: Option<PowerUp>,
    pub grid_width: usize,
    pub grid_height: usize,
    pub score: u32,
    /// Score at which the last power-up appeared
    pub last_power_up_score: u32,
    pub steps: u32,
    pub status: GameStatus,
    pub boosting: bool,
    pub wrap_around: bool,
}

impl GameState {
    /// Create a new game state
    pub fn new(snake: Snake, fruit: Position, grid_width: usize, grid_height: usize) -> Self {
        Self {
            pending_direction: snake.direction,
            snake,
            fruit,
            power_up: None,
            grid_width,
            grid_height,
            score: 0,
            last_power_up_score: 0,
            steps: 0,
            status: GameStatus::Running,
            boosting: false,
            wrap_around: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Running
    }

    pub fn is_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }

    /// Running <-> Paused; has no effect once the game is over
    pub fn toggle_pause(&mut self) {
        self.status = match self.status {
            GameStatus::Running => GameStatus::Paused,
            GameStatus::Paused => GameStatus::Running,
            GameStatus::GameOver => GameStatus::GameOver,
        };
    }

    /// Check if a position is within the grid bounds
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.x < self.grid_width as i32
            && pos.y >= 0
            && pos.y < self.grid_height as i32
    }

    /// Fold an out-of-bounds position back onto the grid
    pub fn wrapped(&self, pos: Position) -> Position {
        Position::new(
            pos.x.rem_euclid(self.grid_width as i32),
            pos.y.rem_euclid(self.grid_height as i32),
        )
    }

    /// Check if a position is occupied by the snake
    pub fn is_occupied_by_snake(&self, pos: Position) -> bool {
        self.snake.contains(pos)
    }

    pub fn power_up_at(&self, pos: Position) -> bool {
        self.power_up.is_some_and(|p| p.position == pos)
    }

    /// Cells holding neither the snake, the fruit nor a power-up
    pub fn free_cells(&self) -> Vec<Position> {
        let mut cells = Vec::new();
        for y in 0..self.grid_height as i32 {
            for x in 0..self.grid_width as i32 {
                let pos = Position::new(x, y);
                if !self.snake.contains(pos) && pos != self.fruit && !self.power_up_at(pos) {
                    cells.push(pos);
                }
            }
        }
        cells
    }
}
