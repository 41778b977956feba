use crate::command_queue::CommandQueue;
use crate::config::ScoringPolicy;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    Cell, Direction, PlayerId, PlayerSnapshot, ServerMessage, GRID_HEIGHT, GRID_WIDTH, PLAYER_IDS,
};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

/// Starting body (head first) and heading for each player id
const SPAWNS: [(PlayerId, [Cell; 2], Direction); 2] = [
    (1, [(5, 5), (4, 5)], Direction::Right),
    (2, [(26, 18), (27, 18)], Direction::Left),
];

#[derive(Debug, Clone)]
pub struct Snake {
    id: PlayerId,
    body: VecDeque<Cell>,
    heading: Direction,
    alive: bool,
    score: u32,
}

impl Snake {
    /// Fresh snake for slot `index` of the spawn table
    fn spawn(index: usize, score: u32) -> Self {
        let (id, body, heading) = SPAWNS[index];
        Self {
            id,
            body: body.into_iter().collect(),
            heading,
            alive: true,
            score,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn body(&self) -> impl Iterator<Item = &Cell> {
        self.body.iter()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn head(&self) -> Option<Cell> {
        self.body.front().copied()
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Changes heading unless `next` is a 180 degree reversal. Returns whether it applied.
    fn turn(&mut self, next: Direction) -> bool {
        if self.heading.is_reversal(next) {
            return false;
        }
        self.heading = next;
        true
    }

    /// Pushes the next head cell without dropping the tail
    fn grow_head(&mut self) {
        if let Some(head) = self.head() {
            self.body.push_front(self.heading.step(head));
        }
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            body: self.body.iter().copied().collect(),
            heading: self.heading,
            alive: self.alive,
            score: self.score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    InProgress,
    /// Holds the instant the round ended, which gates the restart
    Ended { at: Instant },
}

/// What a single tick changed, for logging and tests
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub round_ended: bool,
    pub restarted: bool,
    /// Survivor of a round that ended this tick, if exactly one
    pub winner: Option<PlayerId>,
    pub died: Vec<PlayerId>,
    pub eater: Option<PlayerId>,
}

/// Authoritative state of the match
///
/// Both snakes, the food, the round flag and both command queues live here and
/// are only ever mutated through `&mut self`, so a single lock around the world
/// covers everything a tick touches.
#[derive(Debug)]
pub struct World {
    tick: u64,
    snakes: [Snake; 2],
    queues: [CommandQueue; 2],
    food: Cell,
    round: RoundState,
    scoring: ScoringPolicy,
    respawn_delay: Duration,
    rng: StdRng,
}

impl World {
    pub fn new(scoring: ScoringPolicy, respawn_delay: Duration) -> Self {
        Self::with_rng(scoring, respawn_delay, StdRng::from_entropy())
    }

    pub fn with_rng(scoring: ScoringPolicy, respawn_delay: Duration, mut rng: StdRng) -> Self {
        let food = random_cell(&mut rng);
        Self {
            tick: 0,
            snakes: [Snake::spawn(0, 0), Snake::spawn(1, 0)],
            queues: [CommandQueue::new(), CommandQueue::new()],
            food,
            round: RoundState::InProgress,
            scoring,
            respawn_delay,
            rng,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    #[cfg(test)]
    fn round(&self) -> RoundState {
        self.round
    }

    pub fn is_in_progress(&self) -> bool {
        self.round == RoundState::InProgress
    }

    pub fn snake(&self, id: PlayerId) -> Option<&Snake> {
        self.snakes.iter().find(|snake| snake.id == id)
    }

    pub fn pending_commands(&self, id: PlayerId) -> usize {
        slot(id).map_or(0, |index| self.queues[index].len())
    }

    /// Appends a requested heading to a player's queue. Legality is checked when applied.
    ///
    /// Returns false for an unknown player id.
    pub fn queue_direction(&mut self, id: PlayerId, direction: Direction) -> bool {
        if let Some(index) = slot(id) {
            self.queues[index].push(direction);
            true
        } else {
            false
        }
    }

    /// Advances the match by one step
    ///
    /// While the round is in progress this runs the full simulation step. Once it
    /// has ended, it only checks whether the respawn delay has elapsed and restarts.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        self.tick += 1;

        match self.round {
            RoundState::InProgress => self.advance(now),
            RoundState::Ended { at } => {
                let mut report = TickReport::default();
                if now.duration_since(at) >= self.respawn_delay {
                    self.restart();
                    report.restarted = true;
                }
                report
            }
        }
    }

    fn advance(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        self.check_round_end(now, &mut report);
        self.apply_commands();

        for snake in self.snakes.iter_mut().filter(|snake| snake.alive) {
            snake.grow_head();
        }

        self.resolve_collisions(&mut report);

        let eater = self.resolve_food();
        report.eater = eater.map(|index| self.snakes[index].id);

        for (index, snake) in self.snakes.iter_mut().enumerate() {
            if snake.alive && Some(index) != eater {
                snake.body.pop_back();
            }
        }

        report
    }

    fn check_round_end(&mut self, now: Instant, report: &mut TickReport) {
        let survivors: Vec<usize> = (0..self.snakes.len())
            .filter(|&index| self.snakes[index].alive)
            .collect();

        if survivors.len() > 1 {
            return;
        }

        self.round = RoundState::Ended { at: now };
        report.round_ended = true;

        if let [index] = survivors[..] {
            report.winner = Some(self.snakes[index].id);
            if self.scoring == ScoringPolicy::Wins {
                self.snakes[index].score += 1;
            }
        }

        info!(
            "Round over after tick {}, winner: {}",
            self.tick,
            report
                .winner
                .map_or_else(|| "none".to_string(), |id| format!("player {}", id))
        );
    }

    /// Pops at most one heading per player, queue order preserved
    fn apply_commands(&mut self) {
        for (snake, queue) in self.snakes.iter_mut().zip(self.queues.iter_mut()) {
            if let Some(next) = queue.pop() {
                if snake.turn(next) {
                    debug!("Player {} now heading {:?}", snake.id, next);
                } else {
                    debug!("Player {} reversal to {:?} ignored", snake.id, next);
                }
            }
        }
    }

    /// Marks snakes whose new head hits a wall, themselves, or another living snake
    ///
    /// Every verdict is computed against the same post-movement, pre-shrink bodies
    /// and the alive flags from before this step.
    fn resolve_collisions(&mut self, report: &mut TickReport) {
        let alive: Vec<bool> = self.snakes.iter().map(|snake| snake.alive).collect();
        let crashed: Vec<bool> = (0..self.snakes.len())
            .map(|index| alive[index] && self.collides(index, &alive))
            .collect();

        for (snake, crashed) in self.snakes.iter_mut().zip(crashed) {
            if crashed {
                snake.alive = false;
                report.died.push(snake.id);
                debug!("Player {} crashed at {:?}", snake.id, snake.head());
            }
        }
    }

    fn collides(&self, index: usize, alive: &[bool]) -> bool {
        let snake = &self.snakes[index];
        let Some(head) = snake.head() else {
            return false;
        };

        if !in_bounds(head) {
            return true;
        }

        if snake.body.iter().skip(1).any(|cell| *cell == head) {
            return true;
        }

        self.snakes
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index && alive[*other])
            .any(|(_, other)| other.body.contains(&head))
    }

    /// Finds the eater in id order and relocates the food. Returns the eater's slot.
    fn resolve_food(&mut self) -> Option<usize> {
        let food = self.food;
        let eater = self
            .snakes
            .iter()
            .position(|snake| snake.alive && snake.head() == Some(food))?;

        if self.scoring == ScoringPolicy::Points {
            self.snakes[eater].score += 1;
        }
        self.food = random_cell(&mut self.rng);
        debug!(
            "Player {} ate food at {:?}, next food at {:?}",
            self.snakes[eater].id, food, self.food
        );

        Some(eater)
    }

    fn restart(&mut self) {
        let keep_scores = self.scoring == ScoringPolicy::Wins;
        for (index, snake) in self.snakes.iter_mut().enumerate() {
            let score = if keep_scores { snake.score } else { 0 };
            *snake = Snake::spawn(index, score);
        }
        for (id, queue) in PLAYER_IDS.iter().zip(self.queues.iter_mut()) {
            if !queue.is_empty() {
                debug!("Discarding {} stale commands from player {}", queue.len(), id);
            }
            queue.clear();
        }
        self.food = random_cell(&mut self.rng);
        self.round = RoundState::InProgress;

        info!("Round restarted at tick {}", self.tick);
    }

    /// Builds the broadcast frame for the current state
    pub fn snapshot(&self) -> ServerMessage {
        let players: BTreeMap<String, PlayerSnapshot> = self
            .snakes
            .iter()
            .map(|snake| (snake.id.to_string(), snake.snapshot()))
            .collect();

        ServerMessage::State {
            players,
            food: self.food,
            in_progress: self.is_in_progress(),
        }
    }
}

fn slot(id: PlayerId) -> Option<usize> {
    PLAYER_IDS.iter().position(|player| *player == id)
}

fn in_bounds((x, y): Cell) -> bool {
    (0..GRID_WIDTH).contains(&x) && (0..GRID_HEIGHT).contains(&y)
}

/// Uniform over the whole grid; occupied cells are not excluded
fn random_cell(rng: &mut StdRng) -> Cell {
    (rng.gen_range(0..GRID_WIDTH), rng.gen_range(0..GRID_HEIGHT))
}
